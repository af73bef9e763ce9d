//! Storage analysis and cleanup primitives
//!
//! Everything in this module is synchronous, filesystem-level code. Async
//! callers (the scheduler and the retention service) run it on the blocking
//! pool so disk walks never stall the request-handling runtime.

pub mod aggregate;
pub mod analysis;
pub mod cleanup;
pub mod disk;
pub mod inventory;

/// Minimum free space a volume must retain: 5% or 1 GiB, whichever is larger.
pub const MIN_FREE_PERCENT: f64 = 5.0;
pub const MIN_FREE_BYTES: u64 = 1024 * 1024 * 1024;

/// Free-space percentage below which the analysis emits a warning.
pub const WARNING_FREE_PERCENT: f64 = 10.0;

pub const MIN_RETENTION_DAYS: u32 = 1;
pub const MAX_RETENTION_DAYS: u32 = 365;

/// Fallback write-rate estimate when a volume has no usable history:
/// ~500 MB per hour per camera, around 12 GB per camera per day.
pub const DEFAULT_GB_PER_CAMERA_PER_DAY: f64 = 12.0;

pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// File extension the media server writes recordings with.
pub const RECORDING_EXTENSION: &str = "mp4";

/// Free-space floor for a volume: `max(total * 5%, 1 GiB)`.
pub fn safety_margin_bytes(total_bytes: u64) -> u64 {
    let percent_floor = (total_bytes as f64 * MIN_FREE_PERCENT / 100.0) as u64;
    percent_floor.max(MIN_FREE_BYTES)
}
