//! Lenient instant parsing for event records.
//!
//! ## Summary
//! Clients send instants either with a zone offset (`2024-01-01T14:00:00Z`,
//! `2024-01-01T09:00:00-05:00`, `2024-01-01T14:00:00+0000`) or as zone-naive
//! civil timestamps (`2024-01-01T14:00:00`). Naive values are taken as UTC.
//! Everything is normalized to `DateTime<Utc>` before any rule evaluation.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{CoreError, CoreResult};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// ## Summary
/// Parses an instant that may or may not carry a zone offset.
///
/// ## Errors
/// Returns `CoreError::InvalidInput` if the value matches none of the accepted shapes.
pub fn parse_instant(value: &str) -> CoreResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::InvalidInput(format!("unrecognized datetime: {value}")))
}

/// Formats an instant the way records are written back out.
#[must_use]
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// `serde(with = ...)` adapter for required instants.
pub mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// ## Errors
    /// Propagates the serializer's error.
    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_instant(dt))
    }

    /// ## Errors
    /// Fails when the value is not a string or is not a recognized instant.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_instant(&raw).map_err(serde::de::Error::custom)
    }
}

/// `serde(with = ...)` adapter for nullable instants.
pub mod lenient_option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// ## Errors
    /// Propagates the serializer's error.
    #[expect(clippy::ref_option, reason = "signature required by serde(with)")]
    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_str(&super::format_instant(dt)),
            None => serializer.serialize_none(),
        }
    }

    /// ## Errors
    /// Fails when a present value is not a recognized instant.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse_instant(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
