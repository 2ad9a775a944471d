//! Human-readable renderings of byte counts and timestamps.

use chrono::{DateTime, Utc};

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// Format a byte count with one truncated decimal and a binary unit.
///
/// `512` -> `"512B"`, `2047` -> `"1.9KB"`, `5 * 1024 * 1024` -> `"5.0MB"`.
pub fn naturalsize(count: u64) -> String {
    if count < KB {
        return format!("{count}B");
    }
    let (unit, suffix) = if count < MB {
        (KB, "KB")
    } else if count < GB {
        (MB, "MB")
    } else {
        (GB, "GB")
    };
    // Tenths of a unit, truncated. Integer math keeps it exact.
    let tenths = (count as u128 * 10 / unit as u128) as u64;
    format!("{}.{}{}", tenths / 10, tenths % 10, suffix)
}

/// Render `then` relative to `now`, e.g. "3 hours ago" or "2 days, 1 hour from now".
pub fn naturaltime(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let future = delta.num_seconds() < 0;
    let secs = delta.num_seconds().unsigned_abs();
    let suffix = if future { "from now" } else { "ago" };

    if secs == 0 {
        return "now".to_string();
    }
    if secs < 60 {
        return if secs == 1 {
            format!("a second {suffix}")
        } else {
            format!("{secs} seconds {suffix}")
        };
    }
    if secs < 3600 {
        let mins = secs / 60;
        return if mins == 1 {
            format!("a minute {suffix}")
        } else {
            format!("{mins} minutes {suffix}")
        };
    }
    if secs < 86_400 {
        let hours = secs / 3600;
        return if hours == 1 {
            format!("an hour {suffix}")
        } else {
            format!("{hours} hours {suffix}")
        };
    }
    format!("{} {suffix}", timesince(secs))
}

const CHUNKS: [(u64, &str, &str); 5] = [
    (365 * 86_400, "year", "years"),
    (30 * 86_400, "month", "months"),
    (7 * 86_400, "week", "weeks"),
    (86_400, "day", "days"),
    (3600, "hour", "hours"),
];

/// The two most significant adjacent units, e.g. "2 days, 3 hours".
fn timesince(secs: u64) -> String {
    let Some(first) = CHUNKS.iter().position(|(size, _, _)| secs >= *size) else {
        return "0 hours".to_string();
    };
    let (size, one, many) = CHUNKS[first];
    let count = secs / size;
    let mut out = format!("{count} {}", if count == 1 { one } else { many });

    if let Some(&(next_size, next_one, next_many)) = CHUNKS.get(first + 1) {
        let rest = (secs - count * size) / next_size;
        if rest > 0 {
            let unit = if rest == 1 { next_one } else { next_many };
            out.push_str(&format!(", {rest} {unit}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn naturalsize_bytes() {
        assert_eq!(naturalsize(0), "0B");
        assert_eq!(naturalsize(512), "512B");
        assert_eq!(naturalsize(1023), "1023B");
    }

    #[test]
    fn naturalsize_truncates_instead_of_rounding() {
        assert_eq!(naturalsize(1024), "1.0KB");
        assert_eq!(naturalsize(2048), "2.0KB");
        assert_eq!(naturalsize(2047), "1.9KB");
        assert_eq!(naturalsize(MB - 1), "1023.9KB");
    }

    #[test]
    fn naturalsize_larger_units() {
        assert_eq!(naturalsize(5 * 1024 * 1024), "5.0MB");
        assert_eq!(naturalsize(2 * MB), "2.0MB");
        assert_eq!(naturalsize(GB), "1.0GB");
        assert_eq!(naturalsize(3 * GB + GB / 2), "3.5GB");
        assert_eq!(naturalsize(4096 * GB), "4096.0GB");
    }

    #[test]
    fn naturalsize_suffix_follows_thresholds() {
        for (count, suffix) in [(1, "B"), (KB, "KB"), (MB, "MB"), (GB, "GB"), (u64::MAX, "GB")] {
            let out = naturalsize(count);
            assert!(out.ends_with(suffix), "{out} should end with {suffix}");
            let unit: String = out.chars().filter(|c| c.is_ascii_alphabetic()).collect();
            assert_eq!(unit, suffix);
        }
    }

    #[test]
    fn naturaltime_recent_past() {
        let now = Utc::now();
        assert_eq!(naturaltime(now, now), "now");
        assert_eq!(naturaltime(now - Duration::seconds(1), now), "a second ago");
        assert_eq!(naturaltime(now - Duration::seconds(42), now), "42 seconds ago");
        assert_eq!(naturaltime(now - Duration::seconds(61), now), "a minute ago");
        assert_eq!(naturaltime(now - Duration::minutes(59), now), "59 minutes ago");
        assert_eq!(naturaltime(now - Duration::minutes(90), now), "an hour ago");
        assert_eq!(naturaltime(now - Duration::hours(23), now), "23 hours ago");
    }

    #[test]
    fn naturaltime_days_and_beyond() {
        let now = Utc::now();
        assert_eq!(naturaltime(now - Duration::hours(24), now), "1 day ago");
        assert_eq!(
            naturaltime(now - Duration::days(2) - Duration::hours(3), now),
            "2 days, 3 hours ago"
        );
        assert_eq!(naturaltime(now - Duration::days(15), now), "2 weeks, 1 day ago");
        assert_eq!(naturaltime(now - Duration::days(400), now), "1 year, 1 month ago");
    }

    #[test]
    fn naturaltime_future() {
        let now = Utc::now();
        assert_eq!(naturaltime(now + Duration::minutes(5), now), "5 minutes from now");
        assert_eq!(
            naturaltime(now + Duration::days(1) + Duration::hours(2), now),
            "1 day, 2 hours from now"
        );
    }
}
