//! Millisecond timestamp helpers.
//!
//! Both stores keep timestamps as epoch milliseconds, so in-memory values are
//! truncated to the same precision when they are created.

use chrono::{DateTime, SubsecRound, Utc};

/// Average number of days in a calendar month.
pub const DAYS_PER_MONTH: f64 = 30.44;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Current time at millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn to_millis(value: &DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

/// Converts stored epoch milliseconds; out-of-range values map to the epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Elapsed months between two instants, using [`DAYS_PER_MONTH`].
pub fn months_between(start: &DateTime<Utc>, end: &DateTime<Utc>) -> f64 {
    let elapsed_ms = (*end - *start).num_milliseconds() as f64;
    elapsed_ms / MILLIS_PER_DAY / DAYS_PER_MONTH
}
