//! Store timestamp parsing and display rendering
//!
//! The replica stores timestamps in one of three encodings: the compact
//! Taskwarrior form (`20240301T080000Z`), a decimal epoch, or ISO 8601.
//! Parsing is lenient about which encoding a record uses but strict about
//! malformed values, which callers treat as normalization failures.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Compact UTC form used by `task export`.
const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Parse a stored timestamp string into an absolute instant.
///
/// Returns `None` for empty or malformed input.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, COMPACT_FORMAT) {
        return Some(naive.and_utc());
    }

    // Decimal epoch, possibly fractional. `f64` parsing accepts "nan"
    // and "inf", which are not timestamps.
    if let Some(epoch) = raw.parse::<f64>().ok().filter(|epoch| epoch.is_finite()) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (secs, nanos) = (epoch.div_euclid(1.0) as i64, (epoch.rem_euclid(1.0) * 1e9) as u32);
        return DateTime::from_timestamp(secs, nanos);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    None
}

/// Render an instant as ISO 8601 in the display timezone, offset
/// included, daylight-saving aware.
pub fn render_in_zone(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).to_rfc3339()
}
