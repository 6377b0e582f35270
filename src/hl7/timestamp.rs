//! HL7 TS (timestamp) parsing
//!
//! HL7v2 timestamps are degenerate ISO: `YYYYMMDDHHMMSS` truncated at any
//! point after the day, with an optional fractional second and an optional
//! `±HHMM` offset. Feeds in the wild send anything from a bare date to the
//! full form, so the parser accepts 8, 10, 12, and 14 digit bodies and treats
//! an absent offset as UTC.
//!
//! Parsing is best-effort by design: the extractor falls back to the
//! ingestion clock on `None` and marks the event unordered.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

/// Parses an HL7 TS value into a comparable UTC instant
///
/// Returns `None` for anything that does not parse to a real calendar
/// moment, including out-of-range dates like `20230231`.
pub fn parse_hl7_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    // Split off a trailing ±HHMM offset; '-' cannot appear in the body
    let (body, offset_seconds) = match value.find(['+', '-']) {
        Some(pos) => {
            let (body, offset) = value.split_at(pos);
            (body, parse_offset(offset)?)
        }
        None => (value, 0),
    };

    // Drop fractional seconds
    let body = body.split('.').next().unwrap_or(body);

    if body.len() < 8 || body.len() > 14 || body.len() % 2 != 0 || !body.is_ascii() {
        return None;
    }

    let digit = |range: std::ops::Range<usize>| -> Option<u32> {
        body.get(range).and_then(|s| s.parse().ok())
    };

    let year: i32 = body.get(0..4)?.parse().ok()?;
    let month = digit(4..6)?;
    let day = digit(6..8)?;
    let hour = if body.len() >= 10 { digit(8..10)? } else { 0 };
    let minute = if body.len() >= 12 { digit(10..12)? } else { 0 };
    let second = if body.len() >= 14 { digit(12..14)? } else { 0 };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = FixedOffset::east_opt(offset_seconds)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_offset(offset: &str) -> Option<i32> {
    let (sign, digits) = offset.split_at(1);
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[0..2].parse().ok()?;
    let minutes: i32 = digits[2..4].parse().ok()?;
    let seconds = hours * 3600 + minutes * 60;
    match sign {
        "+" => Some(seconds),
        "-" => Some(-seconds),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_full_14_digit_timestamp() {
        let dt = parse_hl7_timestamp("20230501103045").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 45).unwrap());
    }

    #[test]
    fn test_minute_precision() {
        let dt = parse_hl7_timestamp("202305011030").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_date_only() {
        let dt = parse_hl7_timestamp("20230501").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_fractional_seconds_ignored() {
        let dt = parse_hl7_timestamp("20230501103045.1234").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 45).unwrap());
    }

    #[test]
    fn test_positive_offset_converted_to_utc() {
        let dt = parse_hl7_timestamp("20230501103045+0200").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 5, 1, 8, 30, 45).unwrap());
    }

    #[test]
    fn test_negative_offset_converted_to_utc() {
        let dt = parse_hl7_timestamp("202305011030-0500").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 5, 1, 15, 30, 0).unwrap());
    }

    #[test]
    fn test_garbage_returns_none() {
        assert!(parse_hl7_timestamp("").is_none());
        assert!(parse_hl7_timestamp("yesterday").is_none());
        assert!(parse_hl7_timestamp("2023").is_none());
        assert!(parse_hl7_timestamp("202305011").is_none());
        assert!(parse_hl7_timestamp("20230231").is_none());
        assert!(parse_hl7_timestamp("20230501+02").is_none());
    }
}
