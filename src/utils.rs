//! A collection of utility functions
use std::time::SystemTime;

use chrono::DateTime;
use chrono::Utc;

/// Formats a `SystemTime` for a fixed-width column, minute precision.
/// For example "2018-01-26 18:30". Always 16 display columns.
pub fn format_time_compact(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%Y-%m-%d %H:%M").to_string()
}

/// Formats a byte count with a single lowercase unit suffix: plain
/// bytes below 1000 ("10b"), then "k", "m", "g", "t" with one decimal
/// while the value is below ten ("1.2k", "12k").
pub fn humanize_size(bytes: u64) -> String {
    if bytes < 1000 {
        return format!("{bytes}b");
    }
    let units = ["k", "m", "g", "t", "p"];
    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit + 1 < units.len() {
        value /= 1000.0;
        unit += 1;
    }
    if value < 10.0 {
        format!("{value:.1}{}", units[unit])
    } else {
        format!("{value:.0}{}", units[unit])
    }
}
