//! Retention analysis and policy changes
//!
//! Read side: analyze a volume's disk usage, inventory, and camera load into
//! a [`RetentionAnalysis`] report. Write side: apply a retention change,
//! auto-adjusting or rejecting settings the volume cannot sustain, then
//! enforce the new horizon immediately.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::repositories::{CameraCountSource, VolumeStore};
use crate::errors::{AppError, AppResult};
use crate::models::{AgeBucket, DiskUsage, RetentionAnalysis, RetentionUpdate, StorageVolume};
use crate::storage::{MIN_RETENTION_DAYS, aggregate, analysis, cleanup, inventory};

pub struct RetentionService {
    volumes: Arc<dyn VolumeStore>,
    cameras: Arc<dyn CameraCountSource>,
    // Injected so tests can fake disk capacity.
    probe: fn(&Path) -> DiskUsage,
}

impl RetentionService {
    pub fn new(volumes: Arc<dyn VolumeStore>, cameras: Arc<dyn CameraCountSource>) -> Self {
        Self::with_probe(volumes, cameras, crate::storage::disk::disk_usage)
    }

    pub fn with_probe(
        volumes: Arc<dyn VolumeStore>,
        cameras: Arc<dyn CameraCountSource>,
        probe: fn(&Path) -> DiskUsage,
    ) -> Self {
        Self {
            volumes,
            cameras,
            probe,
        }
    }

    /// Analyze one volume, or the primary volume when `volume_id` is `None`.
    pub async fn analyze(&self, volume_id: Option<Uuid>) -> AppResult<RetentionAnalysis> {
        let volume = self.resolve_volume(volume_id).await?;
        let (usage, buckets) = self.probe_and_scan(&volume).await?;
        let camera_count = self.cameras.active_camera_count().await?;
        Ok(analysis::analyze_retention(
            &volume,
            usage,
            &buckets,
            camera_count,
        ))
    }

    /// Apply a retention change to a volume.
    ///
    /// When the requested horizon exceeds what the volume can sustain, the
    /// value is either adjusted down (`auto_adjust`) or rejected. The new
    /// horizon is enforced immediately rather than waiting for the next
    /// scheduled pass.
    pub async fn set_retention(
        &self,
        volume_id: Uuid,
        requested_days: u32,
        auto_adjust: bool,
    ) -> AppResult<RetentionUpdate> {
        let volume = self.resolve_volume(Some(volume_id)).await?;
        let (usage, buckets) = self.probe_and_scan(&volume).await?;
        let camera_count = self.cameras.active_camera_count().await?;
        let report = analysis::analyze_retention(&volume, usage, &buckets, camera_count);
        let recommended = report.recommended_retention_days;

        let (applied, warning) = if requested_days > recommended {
            if !auto_adjust {
                return Err(AppError::RetentionInfeasible {
                    requested: requested_days,
                    max_days: recommended,
                });
            }
            let applied = recommended.max(MIN_RETENTION_DAYS);
            (
                applied,
                Some(format!(
                    "Requested {requested_days} days exceeds the sustainable maximum; \
                     adjusted to {applied} days"
                )),
            )
        } else {
            (requested_days.max(MIN_RETENTION_DAYS), None)
        };

        self.volumes.set_retention_days(volume.id, applied).await?;
        info!(
            volume = %volume.name,
            requested = requested_days,
            applied,
            "retention updated"
        );

        let mount = volume.mount_path.clone();
        let outcome =
            tokio::task::spawn_blocking(move || cleanup::delete_expired(&mount, applied, Utc::now()))
                .await
                .map_err(|e| AppError::internal(format!("cleanup task panicked: {e}")))?;
        if outcome.files_deleted > 0 {
            info!(
                volume = %volume.name,
                files = outcome.files_deleted,
                freed = %crate::utils::human_format::format_bytes(outcome.bytes_freed),
                "recordings outside the new horizon removed"
            );
        }
        for error in &outcome.errors {
            warn!(volume = %volume.name, %error, "cleanup error while applying retention");
        }

        Ok(RetentionUpdate {
            volume_id: volume.id,
            retention_days: applied,
            recommended_retention_days: recommended,
            warning,
        })
    }

    async fn resolve_volume(&self, volume_id: Option<Uuid>) -> AppResult<StorageVolume> {
        match volume_id {
            Some(id) => self
                .volumes
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::not_found("storage volume", id.to_string())),
            None => self
                .volumes
                .find_primary()
                .await?
                .ok_or_else(|| AppError::not_found("storage volume", "primary")),
        }
    }

    async fn probe_and_scan(
        &self,
        volume: &StorageVolume,
    ) -> AppResult<(DiskUsage, Vec<AgeBucket>)> {
        if !volume.mount_path.exists() {
            return Err(AppError::path_unavailable(&volume.mount_path));
        }

        let mount = volume.mount_path.clone();
        let probe = self.probe;
        let (usage, buckets) = tokio::task::spawn_blocking(move || {
            let usage = probe(&mount);
            let scan = inventory::scan_recordings(&mount, Utc::now());
            (usage, aggregate::storage_by_age(&scan.files))
        })
        .await
        .map_err(|e| AppError::internal(format!("scan task panicked: {e}")))?;

        if usage.is_unknown() {
            return Err(AppError::path_unavailable(&volume.mount_path));
        }
        Ok((usage, buckets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::path::PathBuf;
    use std::time::{Duration as StdDuration, SystemTime};

    use crate::models::VolumeStatus;
    use crate::services::testing::{FixedCameraCount, MemoryVolumeStore};
    use crate::storage::BYTES_PER_GB;

    fn hundred_gb_half_free(_path: &Path) -> DiskUsage {
        DiskUsage {
            total_bytes: 100 * BYTES_PER_GB,
            used_bytes: 50 * BYTES_PER_GB,
            free_bytes: 50 * BYTES_PER_GB,
        }
    }

    fn unknown_probe(_path: &Path) -> DiskUsage {
        DiskUsage::default()
    }

    fn volume(mount_path: PathBuf, retention_days: u32, is_primary: bool) -> StorageVolume {
        StorageVolume {
            id: Uuid::new_v4(),
            name: format!("vol-{}", Uuid::new_v4()),
            mount_path,
            retention_days,
            is_primary,
            is_active: true,
            status: VolumeStatus::Active,
            total_bytes: 0,
            used_bytes: 0,
            last_checked: None,
        }
    }

    fn write_aged(path: &Path, len: usize, age_days: u64) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; len]).unwrap();
        let mtime = SystemTime::now() - StdDuration::from_secs(age_days * 86_400);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    fn service(
        volumes: Arc<MemoryVolumeStore>,
        cameras: usize,
        probe: fn(&Path) -> DiskUsage,
    ) -> RetentionService {
        RetentionService::with_probe(volumes, Arc::new(FixedCameraCount(cameras)), probe)
    }

    #[tokio::test]
    async fn analyze_defaults_to_the_primary_volume() {
        let dir = tempfile::tempdir().unwrap();
        let primary = volume(dir.path().to_path_buf(), 7, true);
        let primary_id = primary.id;
        let store = MemoryVolumeStore::with_volumes(vec![primary]);

        let report = service(store, 1, hundred_gb_half_free)
            .analyze(None)
            .await
            .unwrap();
        assert_eq!(report.volume_id, primary_id);
        // 95 GB usable at the default 12 GB/camera/day rate.
        assert_eq!(report.recommended_retention_days, 7);
    }

    #[tokio::test]
    async fn analyze_unknown_volume_is_not_found() {
        let store = MemoryVolumeStore::with_volumes(vec![]);
        let err = service(store, 1, hundred_gb_half_free)
            .analyze(Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn analyze_without_a_primary_volume_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            MemoryVolumeStore::with_volumes(vec![volume(dir.path().to_path_buf(), 7, false)]);
        let err = service(store, 1, hundred_gb_half_free)
            .analyze(None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn analyze_missing_mount_path_is_unavailable() {
        let vol = volume(PathBuf::from("/no/such/mount"), 7, true);
        let store = MemoryVolumeStore::with_volumes(vec![vol]);
        let err = service(store, 1, hundred_gb_half_free)
            .analyze(None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PathUnavailable { .. }));
    }

    #[tokio::test]
    async fn analyze_unprobeable_mount_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            MemoryVolumeStore::with_volumes(vec![volume(dir.path().to_path_buf(), 7, true)]);
        let err = service(store, 1, unknown_probe).analyze(None).await.unwrap_err();
        assert!(matches!(err, AppError::PathUnavailable { .. }));
    }

    #[tokio::test]
    async fn set_retention_auto_adjusts_when_infeasible() {
        let dir = tempfile::tempdir().unwrap();
        let vol = volume(dir.path().to_path_buf(), 7, true);
        let id = vol.id;
        let store = MemoryVolumeStore::with_volumes(vec![vol]);

        let update = service(store.clone(), 1, hundred_gb_half_free)
            .set_retention(id, 30, true)
            .await
            .unwrap();
        assert_eq!(update.retention_days, 7);
        assert_eq!(update.recommended_retention_days, 7);
        assert!(update.warning.is_some());
        assert_eq!(store.get(id).await.unwrap().retention_days, 7);
    }

    #[tokio::test]
    async fn set_retention_rejects_infeasible_without_auto_adjust() {
        let dir = tempfile::tempdir().unwrap();
        let vol = volume(dir.path().to_path_buf(), 7, true);
        let id = vol.id;
        let store = MemoryVolumeStore::with_volumes(vec![vol]);

        let err = service(store.clone(), 1, hundred_gb_half_free)
            .set_retention(id, 30, false)
            .await
            .unwrap_err();
        match err {
            AppError::RetentionInfeasible { requested, max_days } => {
                assert_eq!(requested, 30);
                assert_eq!(max_days, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Rejected changes leave the volume untouched.
        assert_eq!(store.get(id).await.unwrap().retention_days, 7);
    }

    #[tokio::test]
    async fn set_retention_enforces_the_new_horizon_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("cam/seg-old.mp4");
        let fresh = dir.path().join("cam/seg-new.mp4");
        write_aged(&old, 100, 5);
        write_aged(&fresh, 100, 1);

        let vol = volume(dir.path().to_path_buf(), 7, true);
        let id = vol.id;
        let store = MemoryVolumeStore::with_volumes(vec![vol]);

        let update = service(store, 1, hundred_gb_half_free)
            .set_retention(id, 3, true)
            .await
            .unwrap();
        assert_eq!(update.retention_days, 3);
        assert!(update.warning.is_none());
        assert!(!old.exists());
        assert!(fresh.exists());
    }
}
