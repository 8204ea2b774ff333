//! Timezone resolution for event series.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and timezone canonicalization.

use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{RuleError, RuleResult};

/// Resolver for timezone identifiers.
///
/// Maintains a cache of resolved timezones so a batch of series sharing a
/// zone only canonicalizes it once.
#[derive(Debug, Default)]
pub struct TimeZoneResolver {
    /// Cache of resolved IANA timezones by the name the client sent.
    cache: HashMap<String, Tz>,
}

impl TimeZoneResolver {
    /// Creates a new timezone resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Resolves a timezone name to a `chrono_tz::Tz`.
    ///
    /// Accepts IANA names and their aliases as well as Windows zone names.
    ///
    /// ## Errors
    ///
    /// Returns `RuleError::UnknownTimezone` if the name cannot be resolved.
    ///
    /// ## Side Effects
    ///
    /// Caches successful resolutions to avoid repeated parsing.
    pub fn resolve(&mut self, tzid: &str) -> RuleResult<Tz> {
        if let Some(tz) = self.cache.get(tzid) {
            return Ok(*tz);
        }

        let normalized = normalize_tzid(tzid);

        let tz = Tz::from_str(&normalized)
            .map_err(|_e| RuleError::UnknownTimezone(tzid.to_string()))?;

        tracing::trace!(tzid = %tzid, resolved = %tz, "Resolved timezone");
        self.cache.insert(tzid.to_string(), tz);

        Ok(tz)
    }
}

/// Normalizes timezone names to canonical IANA names.
///
/// Uses ICU4X for Windows timezone ID mapping and IANA canonicalization.
fn normalize_tzid(tzid: &str) -> String {
    let trimmed = tzid.trim();

    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(trimmed, None) {
        // Get the canonical IANA name from the BCP-47 timezone ID
        let iana_parser = IanaParserExtended::new();
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    // Handles aliases like Europe/Kiev -> Europe/Kyiv
    let iana_parser = IanaParserExtended::new();
    let parsed = iana_parser.parse(trimmed);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    trimmed.to_string()
}
