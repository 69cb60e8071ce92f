//! UTC timestamps with a fixed wire form.
//!
//! Timestamps are held at microsecond precision and rendered as RFC 3339
//! with a `Z` suffix, e.g. `2026-10-17T09:30:00.123456Z`. Truncating at
//! creation keeps a value identical across a format/parse round trip.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::TypeError;

/// A UTC instant at microsecond precision.
pub type Timestamp = DateTime<Utc>;

/// The current time, truncated to microseconds.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp in its wire form.
pub fn format(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 timestamp, normalizing it to UTC.
pub fn parse(value: &str) -> Result<Timestamp, TypeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TypeError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
