//! Storage-by-age aggregation
//!
//! Pure functions over an inventory; no I/O of their own.

use std::collections::BTreeMap;

use crate::models::{AgeBucket, RecordingFile};

/// Group recordings by age in days, summing size and counting files per
/// bucket. Returned buckets are sorted ascending by age.
pub fn storage_by_age(files: &[RecordingFile]) -> Vec<AgeBucket> {
    let mut buckets: BTreeMap<u32, (u64, u64)> = BTreeMap::new();
    for file in files {
        let entry = buckets.entry(file.age_days).or_insert((0, 0));
        entry.0 += file.size_bytes;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(age_days, (size_bytes, file_count))| AgeBucket {
            age_days,
            size_bytes,
            file_count,
        })
        .collect()
}

/// Age of the oldest recording in days, 0 for an empty volume.
pub fn oldest_age_days(buckets: &[AgeBucket]) -> u32 {
    buckets.iter().map(|b| b.age_days).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn file(age_days: u32, size_bytes: u64) -> RecordingFile {
        RecordingFile {
            path: PathBuf::from(format!("seg-{age_days}-{size_bytes}.mp4")),
            size_bytes,
            modified_at: Utc::now(),
            age_days,
        }
    }

    #[test]
    fn buckets_are_summed_and_sorted() {
        let files = vec![file(3, 10), file(0, 5), file(3, 20), file(1, 7)];
        let buckets = storage_by_age(&files);
        assert_eq!(
            buckets,
            vec![
                AgeBucket { age_days: 0, size_bytes: 5, file_count: 1 },
                AgeBucket { age_days: 1, size_bytes: 7, file_count: 1 },
                AgeBucket { age_days: 3, size_bytes: 30, file_count: 2 },
            ]
        );
        assert_eq!(oldest_age_days(&buckets), 3);
    }

    #[test]
    fn empty_inventory_has_no_buckets_and_zero_oldest_age() {
        let buckets = storage_by_age(&[]);
        assert!(buckets.is_empty());
        assert_eq!(oldest_age_days(&buckets), 0);
    }
}
