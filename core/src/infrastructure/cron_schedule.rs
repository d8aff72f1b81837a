//! # Cron fire-time computation
//!
//! Computes the next fire time for a recurring schedule's cron expression.
//! The schedule engine (§4.F, §9) accepts the standard five-field
//! minute/hour/day-of-month/month/day-of-week grammar; the `cron` crate
//! itself wants a leading seconds field, so a bare `0 ` is prefixed before
//! handing the expression off. Parsing failures are reported back to the
//! caller, which pauses the schedule and logs rather than surfacing a hard
//! error - an invalid cron expression at fire time is a configuration
//! mistake, not a crash.

use chrono::{DateTime, Utc};
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Parses a five-field `expression` and returns the first fire time
/// strictly after `after`. Returns `None` if the expression doesn't parse
/// (wrong field count included) or has no upcoming fire time.
pub fn next_fire_after(expression: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let expression = expression.trim();
    if expression.split_whitespace().count() != 5 {
        return None;
    }
    let schedule = CronSchedule::from_str(&format!("0 {expression}")).ok()?;
    schedule.after(&after).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_next_minute_boundary() {
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:30Z").unwrap().with_timezone(&Utc);
        let next = next_fire_after("* * * * *", now).unwrap();
        assert_eq!(next, DateTime::parse_from_rfc3339("2026-01-01T00:01:00Z").unwrap().with_timezone(&Utc));
    }

    #[test]
    fn steps_and_leap_day_follow_vixie_semantics() {
        let now = DateTime::parse_from_rfc3339("2028-02-28T23:59:00Z").unwrap().with_timezone(&Utc);
        let next = next_fire_after("*/15 * 29 2 *", now).unwrap();
        assert_eq!(next, DateTime::parse_from_rfc3339("2028-02-29T00:00:00Z").unwrap().with_timezone(&Utc));
    }

    #[test]
    fn rejects_six_field_expression() {
        assert!(next_fire_after("0 * * * * *", Utc::now()).is_none());
    }

    #[test]
    fn invalid_expression_returns_none() {
        assert!(next_fire_after("not a cron expression", Utc::now()).is_none());
    }
}
