//! Small helpers for timestamps and log formatting.

use chrono::{Local, NaiveDateTime};

/// Format of the `last_updated` field and the run banner.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local wall-clock time, second precision.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes with an ellipsis and byte count
/// indicator appended. The cut never splits a multi-byte character, which
/// matters for Hangul page bodies.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // Each Hangul syllable is 3 bytes in UTF-8.
        let s = "금시세금시세";
        assert_eq!(truncate_for_log(s, 4), "금…(+15 bytes)");
        assert_eq!(truncate_for_log(s, 6), "금시…(+12 bytes)");
    }

    #[test]
    fn test_format_timestamp() {
        let at = NaiveDate::from_ymd_opt(2025, 5, 6)
            .unwrap()
            .and_hms_opt(8, 3, 9)
            .unwrap();
        assert_eq!(format_timestamp(at), "2025-05-06 08:03:09");
    }

    #[test]
    fn test_local_now_formats_to_fixed_width() {
        let rendered = format_timestamp(local_now());
        assert_eq!(rendered.len(), 19);
        assert!(NaiveDateTime::parse_from_str(&rendered, TIMESTAMP_FORMAT).is_ok());
    }
}
