//! Timestamps in the service's civil timezone (WIB, UTC+07:00).
//!
//! All rows store fixed-width WIB strings. Display formatting is
//! best-effort: legacy stored formats still parse, anything unrecognized
//! renders unchanged.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

const WIB_OFFSET_SECONDS: i32 = 7 * 3600;
const TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";
const LEGACY_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

fn wib() -> FixedOffset {
    FixedOffset::east_opt(WIB_OFFSET_SECONDS).expect("WIB offset is in range")
}

/// Current time rendered in the canonical stored form.
#[must_use]
pub fn now_wib() -> String {
    format!("{} WIB", Utc::now().with_timezone(&wib()).format(TIME_FORMAT))
}

/// Re-render a stored timestamp in WIB for display.
///
/// Accepts the canonical form (returned as-is), RFC 3339 with `Z` or an
/// offset, and the legacy naive formats (assumed UTC). Unparseable values
/// pass through unchanged.
#[must_use]
pub fn format_wib(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.ends_with("WIB") {
        return trimmed.to_string();
    }
    match parse_instant(trimmed) {
        Some(instant) => format!("{} WIB", instant.with_timezone(&wib()).format(TIME_FORMAT)),
        None => trimmed.to_string(),
    }
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let raw = value.replace('Z', "+00:00");
    if let Ok(aware) = DateTime::parse_from_rfc3339(&raw) {
        return Some(aware.with_timezone(&Utc));
    }
    LEGACY_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_wib_has_canonical_shape() {
        let stamp = now_wib();
        assert!(stamp.ends_with(" WIB"));
        // dd-mm-yyyy hh:mm:ss WIB
        assert_eq!(stamp.len(), "01-01-2024 00:00:00 WIB".len());
    }

    #[test]
    fn canonical_values_pass_through() {
        assert_eq!(format_wib("02-01-2024 10:30:00 WIB"), "02-01-2024 10:30:00 WIB");
    }

    #[test]
    fn legacy_iso_dates_convert_to_wib() {
        // Naive legacy values are assumed UTC; +7h shifts the clock time.
        assert_eq!(format_wib("2024-01-02 03:04:05"), "02-01-2024 10:04:05 WIB");
        assert_eq!(format_wib("02-01-2024 03:04:05"), "02-01-2024 10:04:05 WIB");
    }

    #[test]
    fn rfc3339_values_convert_to_wib() {
        assert_eq!(format_wib("2024-01-02T03:04:05Z"), "02-01-2024 10:04:05 WIB");
        assert_eq!(
            format_wib("2024-01-02T03:04:05+07:00"),
            "02-01-2024 03:04:05 WIB"
        );
    }

    #[test]
    fn unparseable_values_render_unchanged() {
        assert_eq!(format_wib("not a date"), "not a date");
        assert_eq!(format_wib("  padded junk  "), "padded junk");
    }

    #[test]
    fn empty_values_render_empty() {
        assert_eq!(format_wib(""), "");
        assert_eq!(format_wib("   "), "");
    }
}
