//! Periodic cleanup scheduler
//!
//! Owns the background enforcement loop: on every tick it deletes expired
//! recordings from each active volume, evicts oldest recordings when free
//! space drops below the safety floor, and writes the resulting disk
//! observations back to the volume records.
//!
//! A single try-lock gate serializes cleanup passes. The periodic loop skips
//! a tick while a pass is running, and operator-triggered runs fail fast with
//! an in-progress error instead of piling up behind it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::database::repositories::VolumeStore;
use crate::errors::{AppError, AppResult};
use crate::models::{
    CleanupStats, DiskUsage, SchedulerStatus, StorageVolume, VolumeCleanupReport,
    VolumeObservation, VolumeStatus,
};
use crate::storage::{cleanup, safety_margin_bytes};
use crate::utils::human_format;

struct SchedulerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

pub struct CleanupScheduler {
    volumes: Arc<dyn VolumeStore>,
    interval: Duration,
    stats: Arc<RwLock<CleanupStats>>,
    // Serializes cleanup passes across the periodic loop and manual triggers.
    cycle_gate: Arc<Mutex<()>>,
    handle: Mutex<Option<SchedulerHandle>>,
    probe: fn(&Path) -> DiskUsage,
}

impl CleanupScheduler {
    pub fn new(volumes: Arc<dyn VolumeStore>, interval: Duration) -> Self {
        Self::with_probe(volumes, interval, crate::storage::disk::disk_usage)
    }

    pub fn with_probe(
        volumes: Arc<dyn VolumeStore>,
        interval: Duration,
        probe: fn(&Path) -> DiskUsage,
    ) -> Self {
        Self {
            volumes,
            interval,
            stats: Arc::new(RwLock::new(CleanupStats::default())),
            cycle_gate: Arc::new(Mutex::new(())),
            handle: Mutex::new(None),
            probe,
        }
    }

    /// Start the periodic loop. Idempotent; the first pass runs immediately.
    pub async fn start(self: &Arc<Self>) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            debug!("cleanup scheduler already running");
            return;
        }

        let token = CancellationToken::new();
        let task_token = token.clone();
        let scheduler = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = interval(scheduler.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                match scheduler.cycle_gate.clone().try_lock_owned() {
                    Ok(_guard) => scheduler.run_cycle().await,
                    Err(_) => debug!("cleanup pass still running, skipping tick"),
                }
            }
        });

        *handle = Some(SchedulerHandle { token, task });
        info!(interval = ?self.interval, "cleanup scheduler started");
    }

    /// Stop the periodic loop and wait for it to wind down.
    pub async fn stop(&self) {
        let Some(SchedulerHandle { token, task }) = self.handle.lock().await.take() else {
            return;
        };
        token.cancel();
        if let Err(e) = task.await {
            error!("cleanup scheduler task failed to shut down cleanly: {e}");
        }
        info!("cleanup scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    pub async fn status(&self) -> SchedulerStatus {
        let stats = self.stats.read().await.clone();
        SchedulerStatus {
            running: self.is_running().await,
            last_cleanup: stats.last_run,
            stats,
        }
    }

    /// Run a full cleanup pass now. Fails fast when one is already running.
    pub async fn force_cleanup(&self) -> AppResult<CleanupStats> {
        let _guard = self
            .cycle_gate
            .try_lock()
            .map_err(|_| AppError::operation_in_progress("cleanup", "all volumes"))?;
        self.run_cycle().await;
        Ok(self.stats.read().await.clone())
    }

    /// Clean one volume now. Fails fast when a pass is already running.
    pub async fn force_cleanup_volume(&self, volume_id: Uuid) -> AppResult<VolumeCleanupReport> {
        let _guard = self
            .cycle_gate
            .try_lock()
            .map_err(|_| {
                AppError::operation_in_progress("cleanup", format!("volume {volume_id}"))
            })?;

        let volume = self
            .volumes
            .find_by_id(volume_id)
            .await?
            .ok_or_else(|| AppError::not_found("storage volume", volume_id.to_string()))?;
        let outcome = self.cleanup_volume(&volume).await?;
        Ok(VolumeCleanupReport {
            volume_id: volume.id,
            volume_name: volume.name,
            files_deleted: outcome.files_deleted,
            bytes_freed: outcome.bytes_freed,
        })
    }

    /// One pass over every active volume. A failing volume is recorded and
    /// skipped; it never aborts the rest of the pass.
    async fn run_cycle(&self) {
        let volumes = match self.volumes.list_active().await {
            Ok(volumes) => volumes,
            Err(e) => {
                error!("cleanup pass could not list volumes: {e}");
                self.stats.write().await.record_error(format!(
                    "could not list volumes: {e}"
                ));
                return;
            }
        };

        for volume in &volumes {
            if let Err(e) = self.cleanup_volume(volume).await {
                error!(volume = %volume.name, "cleanup failed: {e}");
                self.stats
                    .write()
                    .await
                    .record_error(format!("{}: {e}", volume.name));
            }
        }
        self.stats.write().await.last_run = Some(Utc::now());
    }

    async fn cleanup_volume(&self, volume: &StorageVolume) -> AppResult<cleanup::CleanupOutcome> {
        if !volume.mount_path.exists() {
            self.volumes
                .set_status(volume.id, VolumeStatus::Error)
                .await?;
            return Err(AppError::path_unavailable(&volume.mount_path));
        }

        let mount = volume.mount_path.clone();
        let retention_days = volume.retention_days;
        let probe = self.probe;
        let (outcome, usage) = tokio::task::spawn_blocking(move || {
            let mut outcome = cleanup::delete_expired(&mount, retention_days, Utc::now());
            let usage = probe(&mount);
            // Expiry was not enough; evict oldest recordings down to the
            // free-space floor. Same floor as the full-status check below,
            // so a volume is never marked full without an eviction attempt.
            if !usage.is_unknown() {
                let required = safety_margin_bytes(usage.total_bytes);
                if usage.free_bytes < required {
                    outcome.merge(cleanup::evict_until_free(
                        &mount,
                        required,
                        usage.free_bytes,
                        Utc::now(),
                    ));
                }
            }
            (outcome, probe(&mount))
        })
        .await
        .map_err(|e| AppError::internal(format!("cleanup task panicked: {e}")))?;

        // A failed post-cleanup probe must not zero out the stored capacity.
        if !usage.is_unknown() {
            let status = if usage.free_bytes < safety_margin_bytes(usage.total_bytes) {
                VolumeStatus::Full
            } else {
                VolumeStatus::Active
            };
            self.volumes
                .record_observation(
                    volume.id,
                    VolumeObservation {
                        status,
                        total_bytes: usage.total_bytes,
                        used_bytes: usage.used_bytes,
                        last_checked: Utc::now(),
                    },
                )
                .await?;
        }

        if outcome.files_deleted > 0 {
            info!(
                volume = %volume.name,
                files = outcome.files_deleted,
                freed = %human_format::format_bytes(outcome.bytes_freed),
                "cleanup removed recordings"
            );
        }
        for error in &outcome.errors {
            warn!(volume = %volume.name, %error, "cleanup error");
        }

        let mut stats = self.stats.write().await;
        stats.files_deleted += outcome.files_deleted;
        stats.bytes_freed += outcome.bytes_freed;
        for error in &outcome.errors {
            stats.record_error(format!("{}: {error}", volume.name));
        }
        drop(stats);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::path::PathBuf;
    use std::time::{Duration as StdDuration, SystemTime};

    use crate::services::testing::MemoryVolumeStore;
    use crate::storage::BYTES_PER_GB;

    fn plenty_free(_path: &Path) -> DiskUsage {
        DiskUsage {
            total_bytes: 100 * BYTES_PER_GB,
            used_bytes: 50 * BYTES_PER_GB,
            free_bytes: 50 * BYTES_PER_GB,
        }
    }

    fn nearly_full(_path: &Path) -> DiskUsage {
        DiskUsage {
            total_bytes: 100 * BYTES_PER_GB,
            used_bytes: 98 * BYTES_PER_GB,
            free_bytes: 2 * BYTES_PER_GB,
        }
    }

    fn small_disk_low_free(_path: &Path) -> DiskUsage {
        let total = 10 * BYTES_PER_GB;
        let free = 800 * 1024 * 1024;
        DiskUsage {
            total_bytes: total,
            used_bytes: total - free,
            free_bytes: free,
        }
    }

    fn volume(mount_path: PathBuf, retention_days: u32) -> StorageVolume {
        StorageVolume {
            id: Uuid::new_v4(),
            name: format!("vol-{}", Uuid::new_v4()),
            mount_path,
            retention_days,
            is_primary: false,
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

    fn scheduler(
        store: Arc<MemoryVolumeStore>,
        probe: fn(&Path) -> DiskUsage,
    ) -> CleanupScheduler {
        CleanupScheduler::with_probe(store, Duration::from_secs(3600), probe)
    }

    #[tokio::test]
    async fn force_cleanup_deletes_expired_and_records_observation() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("cam/seg-old.mp4");
        let fresh = dir.path().join("cam/seg-new.mp4");
        write_aged(&old, 100, 9);
        write_aged(&fresh, 100, 1);

        let vol = volume(dir.path().to_path_buf(), 7);
        let id = vol.id;
        let store = MemoryVolumeStore::with_volumes(vec![vol]);

        let stats = scheduler(store.clone(), plenty_free)
            .force_cleanup()
            .await
            .unwrap();
        assert_eq!(stats.files_deleted, 1);
        assert_eq!(stats.bytes_freed, 100);
        assert!(stats.last_run.is_some());
        assert!(!old.exists());
        assert!(fresh.exists());

        let updated = store.get(id).await.unwrap();
        assert_eq!(updated.status, VolumeStatus::Active);
        assert_eq!(updated.total_bytes, 100 * BYTES_PER_GB);
        assert!(updated.last_checked.is_some());
    }

    #[tokio::test]
    async fn force_cleanup_volume_unknown_id_is_not_found() {
        let store = MemoryVolumeStore::with_volumes(vec![]);
        let err = scheduler(store, plenty_free)
            .force_cleanup_volume(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn concurrent_trigger_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let vol = volume(dir.path().to_path_buf(), 7);
        let id = vol.id;
        let store = MemoryVolumeStore::with_volumes(vec![vol]);
        let scheduler = scheduler(store, plenty_free);

        let _in_progress = scheduler.cycle_gate.lock().await;
        let err = scheduler.force_cleanup().await.unwrap_err();
        assert!(matches!(err, AppError::OperationInProgress { .. }));
        match scheduler.force_cleanup_volume(id).await.unwrap_err() {
            AppError::OperationInProgress { resource, .. } => {
                assert!(resource.contains(&id.to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_mount_is_recorded_and_marks_the_volume() {
        let vol = volume(PathBuf::from("/no/such/mount"), 7);
        let id = vol.id;
        let store = MemoryVolumeStore::with_volumes(vec![vol]);

        let stats = scheduler(store.clone(), plenty_free)
            .force_cleanup()
            .await
            .unwrap();
        assert_eq!(stats.files_deleted, 0);
        assert_eq!(stats.recent_errors.len(), 1);
        assert!(stats.last_run.is_some());
        assert_eq!(store.get(id).await.unwrap().status, VolumeStatus::Error);
    }

    #[tokio::test]
    async fn low_free_space_evicts_and_marks_the_volume_full() {
        let dir = tempfile::tempdir().unwrap();
        // Within retention, but the disk is nearly full.
        let seg_a = dir.path().join("seg-a.mp4");
        let seg_b = dir.path().join("seg-b.mp4");
        write_aged(&seg_a, 100, 2);
        write_aged(&seg_b, 100, 1);

        let vol = volume(dir.path().to_path_buf(), 7);
        let id = vol.id;
        let store = MemoryVolumeStore::with_volumes(vec![vol]);

        // 2% free against a 5 GB floor: the deficit dwarfs the files, so
        // eviction consumes the whole inventory.
        let stats = scheduler(store.clone(), nearly_full)
            .force_cleanup()
            .await
            .unwrap();
        assert_eq!(stats.files_deleted, 2);
        assert!(!seg_a.exists());
        assert!(!seg_b.exists());
        assert_eq!(store.get(id).await.unwrap().status, VolumeStatus::Full);
    }

    #[tokio::test]
    async fn small_disk_below_the_byte_floor_still_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let seg = dir.path().join("seg.mp4");
        write_aged(&seg, 100, 1);

        let vol = volume(dir.path().to_path_buf(), 7);
        let id = vol.id;
        let store = MemoryVolumeStore::with_volumes(vec![vol]);

        // 800 MiB free on 10 GiB: above the 5% line but below the 1 GiB
        // floor, so eviction must run and the volume ends up full.
        let stats = scheduler(store.clone(), small_disk_low_free)
            .force_cleanup()
            .await
            .unwrap();
        assert_eq!(stats.files_deleted, 1);
        assert!(!seg.exists());
        assert_eq!(store.get(id).await.unwrap().status, VolumeStatus::Full);
    }

    #[tokio::test]
    async fn scheduler_runs_periodically_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("seg-old.mp4");
        write_aged(&old, 100, 9);
        let store = MemoryVolumeStore::with_volumes(vec![volume(dir.path().to_path_buf(), 7)]);

        let scheduler = Arc::new(CleanupScheduler::with_probe(
            store,
            Duration::from_millis(10),
            plenty_free,
        ));
        scheduler.start().await;
        scheduler.start().await; // idempotent
        assert!(scheduler.is_running().await);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let status = scheduler.status().await;
        assert!(status.running);
        assert!(status.last_cleanup.is_some());
        assert!(!old.exists());

        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
        scheduler.stop().await; // safe to call again
    }
}
