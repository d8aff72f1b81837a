//! Microsecond-resolution timestamp parsing for the CSV ingest contract
//! (§4.C): an integer is disambiguated by magnitude, a non-integer falls
//! back to an RFC 3339 parse.

use chrono::DateTime;

const MICROS_THRESHOLD: i64 = 1_000_000_000_000_000; // > 1e15
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000; // > 1e12

/// Parses a raw `timestamp` field into microseconds since the Unix epoch.
/// Returns `None` on anything unparseable; the caller skips the row.
pub fn parse_timestamp_micros(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(if value > MICROS_THRESHOLD {
            value
        } else if value > MILLIS_THRESHOLD {
            value * 1_000
        } else {
            value * 1_000_000
        });
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.timestamp_micros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disambiguates_by_magnitude() {
        assert_eq!(parse_timestamp_micros("1700000000"), Some(1_700_000_000_000_000));
        assert_eq!(parse_timestamp_micros("1700000000000"), Some(1_700_000_000_000_000));
        assert_eq!(parse_timestamp_micros("1700000000000000"), Some(1_700_000_000_000_000));
    }

    #[test]
    fn falls_back_to_rfc3339() {
        let micros = parse_timestamp_micros("2023-11-14T22:13:20Z").unwrap();
        assert_eq!(micros, 1_700_000_000_000_000);
    }

    #[test]
    fn unparseable_is_none() {
        assert_eq!(parse_timestamp_micros("not-a-timestamp"), None);
        assert_eq!(parse_timestamp_micros(""), None);
    }
}
