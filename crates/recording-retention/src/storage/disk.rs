//! Disk usage probe
//!
//! Reads total/used/free bytes for the filesystem holding a given path via
//! `sysinfo`. Returns an all-zero [`DiskUsage`] when the path is missing or
//! no mounted disk covers it; callers treat that as "unknown", never as an
//! empty disk.

use std::path::{Path, PathBuf};

use sysinfo::Disks;
use tracing::debug;

use crate::models::DiskUsage;

/// Probe disk usage for `path`. Never fails and has no side effects.
pub fn disk_usage(path: &Path) -> DiskUsage {
    let Ok(canonical) = path.canonicalize() else {
        debug!(path = %path.display(), "disk usage unavailable, path not accessible");
        return DiskUsage::default();
    };

    let disks = Disks::new_with_refreshed_list();
    let mounts: Vec<(PathBuf, DiskUsage)> = disks
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let free = disk.available_space();
            (
                disk.mount_point().to_path_buf(),
                DiskUsage {
                    total_bytes: total,
                    used_bytes: total.saturating_sub(free),
                    free_bytes: free,
                },
            )
        })
        .collect();

    longest_mount_match(&canonical, &mounts).unwrap_or_default()
}

/// Pick the disk whose mount point is the longest prefix of `path`, so a
/// dedicated recordings mount wins over the root filesystem it sits under.
fn longest_mount_match(path: &Path, mounts: &[(PathBuf, DiskUsage)]) -> Option<DiskUsage> {
    mounts
        .iter()
        .filter(|(mount, _)| path.starts_with(mount))
        .max_by_key(|(mount, _)| mount.as_os_str().len())
        .map(|(_, usage)| *usage)
}
