//! Domain models for storage volumes, retention analysis, and cleanup telemetry
//!
//! These are the shapes the services and web layer exchange. The persisted
//! representation lives in `crate::entities`; repositories convert between the
//! two.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of entries kept in [`CleanupStats::recent_errors`].
pub const MAX_RECENT_ERRORS: usize = 20;

/// Derived health of a storage volume, recomputed by the cleanup scheduler
/// on every pass. Not authoritative configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VolumeStatus {
    Active,
    Inactive,
    Error,
    Full,
}

/// A configured storage destination with its own retention policy.
#[derive(Debug, Clone, Serialize)]
pub struct StorageVolume {
    pub id: Uuid,
    pub name: String,
    pub mount_path: PathBuf,
    pub retention_days: u32,
    pub is_primary: bool,
    pub is_active: bool,
    pub status: VolumeStatus,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub last_checked: Option<DateTime<Utc>>,
}

/// Disk usage snapshot written back to a volume by the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct VolumeObservation {
    pub status: VolumeStatus,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub last_checked: DateTime<Utc>,
}

/// A recording file discovered by an inventory scan. Never persisted; the
/// filesystem is the single source of truth and every scan starts fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
    /// Whole calendar days between the scan date and the file's mtime date.
    pub age_days: u32,
}

/// Aggregated recording usage for one age-in-days bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeBucket {
    pub age_days: u32,
    pub size_bytes: u64,
    pub file_count: u64,
}

/// Total/used/free bytes for a filesystem path. All-zero means *unknown*
/// (missing or unreadable path), not an empty disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl DiskUsage {
    pub fn is_unknown(&self) -> bool {
        self.total_bytes == 0
    }

    pub fn free_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.free_bytes as f64 / self.total_bytes as f64 * 100.0
        }
    }

    pub fn used_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.total_bytes as f64 * 100.0
        }
    }
}

/// Disk usage section of a retention analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct DiskUsageReport {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_percent: f64,
    pub free_percent: f64,
}

impl From<DiskUsage> for DiskUsageReport {
    fn from(usage: DiskUsage) -> Self {
        Self {
            total_bytes: usage.total_bytes,
            used_bytes: usage.used_bytes,
            free_bytes: usage.free_bytes,
            usage_percent: round2(usage.used_percent()),
            free_percent: round2(usage.free_percent()),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Severity of an analysis warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Warning,
    Critical,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageWarning {
    pub level: WarningLevel,
    pub message: String,
}

impl StorageWarning {
    pub fn new<S: Into<String>>(level: WarningLevel, message: S) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Recording totals section of a retention analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSummary {
    pub total_bytes: u64,
    pub oldest_days: u32,
    pub days_breakdown: Vec<AgeBucket>,
}

/// Camera-derived figures in a retention analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct CameraSummary {
    pub active_count: usize,
    pub estimated_gb_per_camera_per_day: f64,
}

/// Result of analyzing a volume's storage and retention sustainability.
/// A pure report; producing it never mutates anything.
#[derive(Debug, Clone, Serialize)]
pub struct RetentionAnalysis {
    pub volume_id: Uuid,
    pub volume_name: String,
    pub mount_path: PathBuf,
    pub current_retention_days: u32,
    pub recommended_retention_days: u32,
    pub storage: DiskUsageReport,
    pub recordings: RecordingSummary,
    pub cameras: CameraSummary,
    pub warnings: Vec<StorageWarning>,
    pub can_increase_retention: bool,
}

/// Result of applying a retention settings change.
#[derive(Debug, Clone, Serialize)]
pub struct RetentionUpdate {
    pub volume_id: Uuid,
    /// The retention actually persisted, after any auto-adjustment.
    pub retention_days: u32,
    pub recommended_retention_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Result of an operator-triggered cleanup of a single volume.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeCleanupReport {
    pub volume_id: Uuid,
    pub volume_name: String,
    pub files_deleted: u64,
    pub bytes_freed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupErrorEntry {
    pub occurred_at: DateTime<Utc>,
    pub message: String,
}

/// Process-lifetime cleanup telemetry. In-memory only; reset on restart.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupStats {
    pub files_deleted: u64,
    pub bytes_freed: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub recent_errors: Vec<CleanupErrorEntry>,
}

impl CleanupStats {
    /// Record an error, keeping only the most recent entries.
    pub fn record_error<S: Into<String>>(&mut self, message: S) {
        self.recent_errors.push(CleanupErrorEntry {
            occurred_at: Utc::now(),
            message: message.into(),
        });
        if self.recent_errors.len() > MAX_RECENT_ERRORS {
            let excess = self.recent_errors.len() - MAX_RECENT_ERRORS;
            self.recent_errors.drain(..excess);
        }
    }
}

/// Scheduler status exposed on the operator surface.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub last_cleanup: Option<DateTime<Utc>>,
    pub stats: CleanupStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_status_round_trips_as_lowercase() {
        assert_eq!(VolumeStatus::Full.to_string(), "full");
        assert_eq!("error".parse::<VolumeStatus>().unwrap(), VolumeStatus::Error);
        assert!("bogus".parse::<VolumeStatus>().is_err());
    }

    #[test]
    fn disk_usage_percentages() {
        let usage = DiskUsage {
            total_bytes: 100,
            used_bytes: 40,
            free_bytes: 60,
        };
        assert_eq!(usage.free_percent(), 60.0);
        assert_eq!(usage.used_percent(), 40.0);
        assert!(!usage.is_unknown());
        assert!(DiskUsage::default().is_unknown());
        assert_eq!(DiskUsage::default().free_percent(), 0.0);
    }

    #[test]
    fn recent_errors_are_bounded() {
        let mut stats = CleanupStats::default();
        for i in 0..(MAX_RECENT_ERRORS + 10) {
            stats.record_error(format!("error {i}"));
        }
        assert_eq!(stats.recent_errors.len(), MAX_RECENT_ERRORS);
        // Oldest entries were dropped first.
        assert_eq!(stats.recent_errors[0].message, "error 10");
    }
}
