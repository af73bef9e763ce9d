//! Recording inventory scanner
//!
//! Walks a volume's directory tree and returns every recording file with its
//! size, mtime, and age in whole days. The directory convention nests
//! tenant/location/camera levels arbitrarily, so depth is unbounded and the
//! scanner never interprets directory names.
//!
//! This is a best-effort inventory: entries that error mid-scan (deleted
//! concurrently by the media server, permission denied) are skipped, but each
//! skip is recorded so failures stay observable.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::trace;

use super::RECORDING_EXTENSION;
use crate::models::RecordingFile;

/// A file or directory the scanner could not read.
#[derive(Debug, Clone)]
pub struct ScanSkip {
    pub path: PathBuf,
    pub reason: String,
}

impl ScanSkip {
    fn new(path: &Path, error: &std::io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: error.to_string(),
        }
    }
}

impl std::fmt::Display for ScanSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped {}: {}", self.path.display(), self.reason)
    }
}

/// The live list of recordings on a volume at a point in time.
#[derive(Debug, Default)]
pub struct Inventory {
    pub files: Vec<RecordingFile>,
    pub skipped: Vec<ScanSkip>,
}

impl Inventory {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }
}

/// Scan every recording beneath `base`. Returns an empty inventory when the
/// base path does not exist. Order of `files` is unspecified.
pub fn scan_recordings(base: &Path, now: DateTime<Utc>) -> Inventory {
    let mut inventory = Inventory::default();
    if !base.exists() {
        return inventory;
    }

    let mut pending = vec![base.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                inventory.skipped.push(ScanSkip::new(&dir, &e));
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    inventory.skipped.push(ScanSkip::new(&dir, &e));
                    continue;
                }
            };
            let path = entry.path();

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    inventory.skipped.push(ScanSkip::new(&path, &e));
                    continue;
                }
            };

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !is_recording(&path) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    inventory.skipped.push(ScanSkip::new(&path, &e));
                    continue;
                }
            };
            let modified_at: DateTime<Utc> = match metadata.modified() {
                Ok(modified) => modified.into(),
                Err(e) => {
                    inventory.skipped.push(ScanSkip::new(&path, &e));
                    continue;
                }
            };

            inventory.files.push(RecordingFile {
                path,
                size_bytes: metadata.len(),
                modified_at,
                age_days: age_in_days(now, modified_at),
            });
        }
    }

    trace!(
        base = %base.display(),
        files = inventory.files.len(),
        skipped = inventory.skipped.len(),
        "inventory scan complete"
    );
    inventory
}

fn is_recording(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(RECORDING_EXTENSION))
}

/// Whole calendar days between `now` and `modified_at`, clamped to zero for
/// files dated in the future.
pub fn age_in_days(now: DateTime<Utc>, modified_at: DateTime<Utc>) -> u32 {
    let days = now
        .date_naive()
        .signed_duration_since(modified_at.date_naive())
        .num_days();
    days.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::fs;

    fn write_file(path: &Path, len: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn scans_nested_directories_and_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        write_file(&base.join("tenant-a/loc-1/cam-1/seg-001.mp4"), 100);
        write_file(&base.join("tenant-a/loc-1/cam-1/seg-002.MP4"), 50);
        write_file(&base.join("tenant-b/cam-2/seg-003.mp4"), 25);
        write_file(&base.join("tenant-b/cam-2/index.txt"), 10);

        let inventory = scan_recordings(base, Utc::now());
        assert_eq!(inventory.files.len(), 3);
        assert_eq!(inventory.total_bytes(), 175);
        assert!(inventory.skipped.is_empty());
        assert!(inventory.files.iter().all(|f| f.age_days == 0));
    }

    #[test]
    fn missing_base_yields_empty_inventory() {
        let inventory = scan_recordings(Path::new("/no/such/volume"), Utc::now());
        assert!(inventory.files.is_empty());
        assert!(inventory.skipped.is_empty());
    }

    #[test]
    fn age_is_whole_days_from_calendar_dates() {
        let now = "2026-08-27T01:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let yesterday_late = "2026-08-26T23:30:00Z".parse::<DateTime<Utc>>().unwrap();
        // Only 90 minutes elapsed, but the calendar date differs by one day.
        assert_eq!(age_in_days(now, yesterday_late), 1);
        assert_eq!(age_in_days(now, now - Duration::days(9)), 9);
        // Future-dated files never report negative age.
        assert_eq!(age_in_days(now, now + Duration::days(3)), 0);
    }
}
