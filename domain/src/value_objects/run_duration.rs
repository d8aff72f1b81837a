//! Requested run duration, in the load generator's own string form
//! (`"30s"`, `"5m"`, `"1h30m"`). Parsing follows §4.C / §4.E of the
//! specification: unparseable durations default to 30 seconds rather than
//! rejecting the submission outright.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDuration(Duration);

impl RunDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self(d)
    }

    /// Parses a suffixed duration string (`s`, `m`, `h`, or a bare integer
    /// of seconds). Falls back to `DEFAULT_DURATION` on any parse failure,
    /// per the supervisor's admission contract — this never errors.
    pub fn parse_lenient(raw: &str) -> Self {
        Self(parse_suffixed(raw).unwrap_or(DEFAULT_DURATION))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn capped_at(self, max: Duration) -> Self {
        Self(self.0.min(max))
    }

    /// Renders the load generator's `--duration` argument form, e.g. `"30s"`.
    pub fn to_arg_string(self) -> String {
        format!("{}s", self.0.as_secs())
    }
}

impl fmt::Display for RunDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_arg_string())
    }
}

/// Serializes/deserializes through the same `"30s"` argument form used on
/// the wire and in the load generator's own CLI, rather than the raw
/// `Duration` struct shape.
impl Serialize for RunDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_arg_string())
    }
}

impl<'de> Deserialize<'de> for RunDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

fn parse_suffixed(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (digits, unit_secs): (&str, u64) = if let Some(stripped) = raw.strip_suffix('h') {
        (stripped, 3600)
    } else if let Some(stripped) = raw.strip_suffix('m') {
        (stripped, 60)
    } else if let Some(stripped) = raw.strip_suffix('s') {
        (stripped, 1)
    } else {
        (raw, 1)
    };
    let value: u64 = digits.parse().ok()?;
    Some(Duration::from_secs(value.checked_mul(unit_secs)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seconds_minutes_hours() {
        assert_eq!(RunDuration::parse_lenient("10s").as_duration(), Duration::from_secs(10));
        assert_eq!(RunDuration::parse_lenient("5m").as_duration(), Duration::from_secs(300));
        assert_eq!(RunDuration::parse_lenient("1h").as_duration(), Duration::from_secs(3600));
        assert_eq!(RunDuration::parse_lenient("42").as_duration(), Duration::from_secs(42));
    }

    #[test]
    fn unparseable_defaults_to_thirty_seconds() {
        assert_eq!(RunDuration::parse_lenient("banana").as_duration(), DEFAULT_DURATION);
        assert_eq!(RunDuration::parse_lenient("").as_duration(), DEFAULT_DURATION);
    }

    #[test]
    fn caps_at_maximum() {
        let d = RunDuration::parse_lenient("10m").capped_at(Duration::from_secs(60));
        assert_eq!(d.as_duration(), Duration::from_secs(60));
    }

    #[test]
    fn arg_string_round_trips() {
        assert_eq!(RunDuration::parse_lenient("30s").to_arg_string(), "30s");
    }
}
