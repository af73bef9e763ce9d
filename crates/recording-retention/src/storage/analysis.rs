//! Retention feasibility analysis
//!
//! Pure arithmetic over a disk-usage probe, an age-bucketed inventory, and
//! the active camera count. All sizing math works in GiB-based "GB" units to
//! match how the probe reports capacity.

use super::{
    BYTES_PER_GB, DEFAULT_GB_PER_CAMERA_PER_DAY, MAX_RETENTION_DAYS, MIN_RETENTION_DAYS,
    WARNING_FREE_PERCENT, aggregate, safety_margin_bytes,
};
use crate::models::{
    AgeBucket, CameraSummary, DiskUsage, RecordingSummary, RetentionAnalysis, StorageVolume,
    StorageWarning, WarningLevel,
};

/// Number of age buckets included in an analysis report's breakdown.
const BREAKDOWN_BUCKETS: usize = 10;

/// Maximum retention the volume can sustain given its usable capacity and the
/// estimated per-camera write rate. With no cameras or no usable rate there is
/// nothing consuming space, so the cap is the policy maximum.
pub fn calculate_max_retention_days(
    available_bytes: u64,
    camera_count: usize,
    gb_per_camera_per_day: f64,
) -> u32 {
    if camera_count == 0 || gb_per_camera_per_day <= 0.0 {
        return MAX_RETENTION_DAYS;
    }
    let available_gb = available_bytes as f64 / BYTES_PER_GB as f64;
    let daily_gb = camera_count as f64 * gb_per_camera_per_day;
    let days = (available_gb / daily_gb).floor() as i64;
    days.clamp(i64::from(MIN_RETENTION_DAYS), i64::from(MAX_RETENTION_DAYS)) as u32
}

/// Space needed to hold `retention_days` of recordings at the estimated rate.
pub fn estimate_required_bytes(
    retention_days: u32,
    camera_count: usize,
    gb_per_camera_per_day: f64,
) -> u64 {
    let gb = f64::from(retention_days) * camera_count as f64 * gb_per_camera_per_day;
    (gb * BYTES_PER_GB as f64) as u64
}

/// Empirical write rate in GB per camera per day, derived from what is
/// actually on disk. Falls back to the default estimate when the volume has
/// no recordings or everything was written today.
pub fn daily_rate_per_camera(total_bytes: u64, oldest_days: u32, camera_count: usize) -> f64 {
    if total_bytes == 0 || oldest_days == 0 {
        return DEFAULT_GB_PER_CAMERA_PER_DAY;
    }
    let total_gb = total_bytes as f64 / BYTES_PER_GB as f64;
    total_gb / f64::from(oldest_days) / camera_count.max(1) as f64
}

/// Build the full retention analysis report for one volume.
pub fn analyze_retention(
    volume: &StorageVolume,
    usage: DiskUsage,
    buckets: &[AgeBucket],
    camera_count: usize,
) -> RetentionAnalysis {
    let total_recording_bytes: u64 = buckets.iter().map(|b| b.size_bytes).sum();
    let oldest_days = aggregate::oldest_age_days(buckets);
    let rate = daily_rate_per_camera(total_recording_bytes, oldest_days, camera_count);

    let margin = safety_margin_bytes(usage.total_bytes);
    let available = usage.total_bytes.saturating_sub(margin);
    let recommended = calculate_max_retention_days(available, camera_count, rate);

    let mut warnings = Vec::new();
    let free_percent = usage.free_percent();
    if free_percent < super::MIN_FREE_PERCENT {
        warnings.push(StorageWarning::new(
            WarningLevel::Critical,
            format!(
                "Critically low disk space: {free_percent:.1}% free on {}",
                volume.name
            ),
        ));
    } else if free_percent < WARNING_FREE_PERCENT {
        warnings.push(StorageWarning::new(
            WarningLevel::Warning,
            format!(
                "Low disk space: {free_percent:.1}% free on {}",
                volume.name
            ),
        ));
    }
    if volume.retention_days > recommended {
        warnings.push(StorageWarning::new(
            WarningLevel::Warning,
            format!(
                "Current retention of {} days exceeds the sustainable maximum of {} days",
                volume.retention_days, recommended
            ),
        ));
    }
    let required = estimate_required_bytes(volume.retention_days, camera_count, rate);
    if required > usage.total_bytes {
        warnings.push(StorageWarning::new(
            WarningLevel::Error,
            format!(
                "Retention of {} days needs more space than the volume has in total",
                volume.retention_days
            ),
        ));
    }

    RetentionAnalysis {
        volume_id: volume.id,
        volume_name: volume.name.clone(),
        mount_path: volume.mount_path.clone(),
        current_retention_days: volume.retention_days,
        recommended_retention_days: recommended,
        storage: usage.into(),
        recordings: RecordingSummary {
            total_bytes: total_recording_bytes,
            oldest_days,
            days_breakdown: buckets.iter().copied().take(BREAKDOWN_BUCKETS).collect(),
        },
        cameras: CameraSummary {
            active_count: camera_count,
            estimated_gb_per_camera_per_day: rate,
        },
        warnings,
        can_increase_retention: recommended > volume.retention_days,
    }
}
