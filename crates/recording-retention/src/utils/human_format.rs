//! Human-readable formatting for byte counts

/// Format a byte count with the right unit for log lines.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;
    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{size:.0}{}", UNITS[unit_index])
    } else if size >= 10.0 {
        format!("{size:.1}{}", UNITS[unit_index])
    } else {
        format!("{size:.2}{}", UNITS[unit_index])
    }
}
