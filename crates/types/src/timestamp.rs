//! Lenient timestamp coercion.
//!
//! Clients send dates in whatever shape their platform produces. Incoming payloads may carry:
//! - RFC 3339 strings (`2025-03-01T10:00:00Z`, `2025-03-01T12:00:00+02:00`)
//! - naive date-times (`2025-03-01T10:00:00`, `2025-03-01 10:00:00.250`), taken as UTC
//! - plain dates (`2025-03-01`), taken as midnight UTC
//! - integer epoch milliseconds (`1740823200000`)
//!
//! All of them normalise to `DateTime<Utc>` before reaching a handler. Use the serde helpers with
//! `#[serde(deserialize_with = "timestamp::deserialize")]`, or
//! `#[serde(default, deserialize_with = "timestamp::deserialize_option")]` for nullable fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, Deserializer, Visitor};
use std::fmt;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Errors produced while coercing a timestamp.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("invalid timestamp '{0}'")]
    Unparseable(String),
    #[error("epoch milliseconds {0} out of range")]
    OutOfRange(i64),
}

/// Parses a textual timestamp in any of the accepted shapes.
pub fn parse(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let text = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(TimestampError::Unparseable(input.to_owned()))
}

/// Converts epoch milliseconds into a UTC timestamp.
pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>, TimestampError> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or(TimestampError::OutOfRange(millis))
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a date string or epoch milliseconds")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        from_epoch_millis(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let millis = i64::try_from(v).map_err(|_| E::custom(TimestampError::OutOfRange(i64::MAX)))?;
        from_epoch_millis(millis).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() || v.fract() != 0.0 {
            return Err(E::invalid_type(de::Unexpected::Float(v), &self));
        }
        from_epoch_millis(v as i64).map_err(E::custom)
    }
}

struct OptionalTimestampVisitor;

impl<'de> Visitor<'de> for OptionalTimestampVisitor {
    type Value = Option<DateTime<Utc>>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, a date string or epoch milliseconds")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(TimestampVisitor).map(Some)
    }
}

/// Serde helper for a required timestamp field.
pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(TimestampVisitor)
}

/// Serde helper for a nullable timestamp field.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(OptionalTimestampVisitor)
}
