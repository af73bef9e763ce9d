//! Recording deletion
//!
//! Two deletion strategies share one outcome type: age-based expiry driven by
//! a volume's retention policy, and oldest-first eviction driven by a
//! free-space deficit. Both re-scan the filesystem rather than trusting any
//! cached inventory, and both leave directories tidy by pruning empties.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::inventory::{self, Inventory};
use crate::models::RecordingFile;

/// What a deletion pass accomplished. Failed deletions are reported in
/// `errors` and never counted in the totals.
#[derive(Debug, Default, Clone)]
pub struct CleanupOutcome {
    pub files_deleted: u64,
    pub bytes_freed: u64,
    pub errors: Vec<String>,
}

impl CleanupOutcome {
    pub fn merge(&mut self, other: CleanupOutcome) {
        self.files_deleted += other.files_deleted;
        self.bytes_freed += other.bytes_freed;
        self.errors.extend(other.errors);
    }

    fn delete(&mut self, file: &RecordingFile) {
        match std::fs::remove_file(&file.path) {
            Ok(()) => {
                self.files_deleted += 1;
                self.bytes_freed += file.size_bytes;
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "failed to delete recording");
                self.errors
                    .push(format!("failed to delete {}: {e}", file.path.display()));
            }
        }
    }

    fn absorb_skips(&mut self, inventory: &Inventory) {
        for skip in &inventory.skipped {
            self.errors.push(skip.to_string());
        }
    }
}

/// Delete every recording at or past the retention horizon. A file aged
/// exactly `retention_days` is expired.
pub fn delete_expired(base: &Path, retention_days: u32, now: DateTime<Utc>) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();
    let inventory = inventory::scan_recordings(base, now);
    outcome.absorb_skips(&inventory);

    for file in &inventory.files {
        if file.age_days >= retention_days {
            outcome.delete(file);
        }
    }

    if outcome.files_deleted > 0 {
        debug!(
            base = %base.display(),
            retention_days,
            files = outcome.files_deleted,
            bytes = outcome.bytes_freed,
            "expired recordings removed"
        );
    }
    // Prune even when nothing expired; external writers leave empty
    // directories behind too.
    prune_empty_dirs(base);
    outcome
}

/// Delete oldest recordings until the projected free space reaches
/// `required_free_bytes`. Deletion stops as soon as the freed total covers
/// the deficit; a no-op when there is no deficit.
pub fn evict_until_free(
    base: &Path,
    required_free_bytes: u64,
    current_free_bytes: u64,
    now: DateTime<Utc>,
) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();
    let deficit = required_free_bytes.saturating_sub(current_free_bytes);
    if deficit == 0 {
        return outcome;
    }

    let mut inventory = inventory::scan_recordings(base, now);
    outcome.absorb_skips(&inventory);
    // Stable sort keeps scan order among equal mtimes.
    inventory.files.sort_by_key(|f| f.modified_at);

    for file in &inventory.files {
        if outcome.bytes_freed >= deficit {
            break;
        }
        outcome.delete(file);
    }

    if outcome.files_deleted > 0 {
        debug!(
            base = %base.display(),
            deficit,
            files = outcome.files_deleted,
            bytes = outcome.bytes_freed,
            "evicted oldest recordings to recover space"
        );
    }
    prune_empty_dirs(base);
    outcome
}

/// Remove empty directories beneath `base`, bottom-up. `base` itself is
/// never removed. Failures are ignored; a directory that gained a file
/// between the scan and the remove simply stays.
pub fn prune_empty_dirs(base: &Path) {
    let mut dirs = Vec::new();
    let mut pending = vec![base.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                let path = entry.path();
                dirs.push(path.clone());
                pending.push(path);
            }
        }
    }

    // Deepest first, so a chain of empty directories collapses in one pass.
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in dirs {
        let _ = std::fs::remove_dir(&dir);
    }
}
