//! Recurrence rule model as carried in `dates.recurring_rule`.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sked_core::util::datetime::lenient_option;
use std::fmt;
use std::str::FromStr;

use crate::error::{RuleError, RuleResult};

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    pub(crate) const fn to_rrule(self) -> rrule::Frequency {
        match self {
            Self::Daily => rrule::Frequency::Daily,
            Self::Weekly => rrule::Frequency::Weekly,
            Self::Monthly => rrule::Frequency::Monthly,
            Self::Yearly => rrule::Frequency::Yearly,
        }
    }

    /// Whether "Nth weekday of the period" filters make sense for this frequency.
    #[must_use]
    pub const fn supports_ordinal_weekday(self) -> bool {
        matches!(self, Self::Monthly | Self::Yearly)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule terminates.
///
/// Unrecognized values deserialize to `Unknown` and are left alone by [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndRepeatMode {
    Unlimited,
    Count,
    Until,
    #[serde(other)]
    Unknown,
}

/// A recurrence rule.
///
/// `bymonth`, `byhour` and `byminute` are kept in `extra` untouched; they are
/// stored but not applied during expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u16,
    #[serde(
        rename = "endRepeatMode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub end_repeat_mode: Option<EndRepeatMode>,
    #[serde(default, with = "lenient_option")]
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byday: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const fn default_interval() -> u16 {
    1
}

impl RecurringRule {
    /// Creates an unbounded rule with interval 1.
    #[must_use]
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            end_repeat_mode: Some(EndRepeatMode::Unlimited),
            until: None,
            count: None,
            byday: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: u16) -> Self {
        self.interval = interval;
        self
    }

    /// Terminates after `count` occurrences.
    #[must_use]
    pub const fn with_count(mut self, count: u32) -> Self {
        self.end_repeat_mode = Some(EndRepeatMode::Count);
        self.count = Some(count);
        self
    }

    /// Terminates at `until` (inclusive).
    #[must_use]
    pub const fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.end_repeat_mode = Some(EndRepeatMode::Until);
        self.until = Some(until);
        self
    }

    #[must_use]
    pub fn with_byday(mut self, byday: impl Into<String>) -> Self {
        self.byday = Some(byday.into());
        self
    }

    /// ## Summary
    /// Parses the `byday` field, if any.
    ///
    /// ## Errors
    /// Returns `RuleError::InvalidByDay` for unknown weekday codes, and for
    /// ordinal tokens on frequencies without a month or year period.
    pub fn parsed_byday(&self) -> RuleResult<Option<ByDay>> {
        let Some(raw) = self.byday.as_deref().filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };

        let byday = raw.parse::<ByDay>()?;
        if matches!(byday, ByDay::Ordinal { .. }) && !self.frequency.supports_ordinal_weekday() {
            return Err(RuleError::InvalidByDay {
                value: raw.to_string(),
                reason: "ordinal weekdays require MONTHLY or YEARLY frequency",
            });
        }
        Ok(Some(byday))
    }

    /// ## Summary
    /// Checks the rule can be expanded, without expanding it.
    ///
    /// ## Errors
    /// Returns an error for a zero interval or a malformed `byday`.
    pub fn validate(&self) -> RuleResult<()> {
        if self.interval == 0 {
            return Err(RuleError::InvalidInterval(self.interval));
        }
        self.parsed_byday().map(|_| ())
    }
}

/// ## Summary
/// Enforces mutual exclusivity of `count` and `until` according to `endRepeatMode`.
///
/// - `unlimited` clears both
/// - `count` clears `until`
/// - `until` clears `count`
///
/// Missing or unrecognized modes leave the rule as provided. Idempotent.
#[must_use]
pub fn normalize(mut rule: RecurringRule) -> RecurringRule {
    match rule.end_repeat_mode {
        Some(EndRepeatMode::Unlimited) => {
            rule.count = None;
            rule.until = None;
        }
        Some(EndRepeatMode::Count) => rule.until = None,
        Some(EndRepeatMode::Until) => rule.count = None,
        Some(EndRepeatMode::Unknown) | None => {}
    }
    rule
}

/// Parsed `byday` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByDay {
    /// Nth (or Nth-from-end when negative) weekday of the month or year, e.g. `1FR`, `-2MO`.
    Ordinal { nth: i16, weekday: Weekday },
    /// Plain weekday list, e.g. `MO WE FR`.
    Weekdays(Vec<Weekday>),
}

impl ByDay {
    pub(crate) fn to_rrule(&self) -> Vec<rrule::NWeekday> {
        match self {
            Self::Ordinal { nth, weekday } => vec![rrule::NWeekday::Nth(*nth, *weekday)],
            Self::Weekdays(days) => days.iter().copied().map(rrule::NWeekday::Every).collect(),
        }
    }
}

impl FromStr for ByDay {
    type Err = RuleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let invalid = |reason| RuleError::InvalidByDay {
            value: value.to_string(),
            reason,
        };

        match unsigned.as_bytes().first() {
            Some(digit @ b'1'..=b'5') => {
                let nth = i16::from(*digit - b'0');
                let weekday = parse_weekday(&unsigned[1..])
                    .ok_or_else(|| invalid("expected a weekday code after the ordinal"))?;
                Ok(Self::Ordinal {
                    nth: if negative { -nth } else { nth },
                    weekday,
                })
            }
            _ if trimmed.len() != unsigned.len() => Err(invalid("sign must precede an ordinal 1-5")),
            _ => trimmed
                .split_whitespace()
                .map(|code| parse_weekday(code).ok_or_else(|| invalid("unknown weekday code")))
                .collect::<RuleResult<Vec<_>>>()
                .map(Self::Weekdays),
        }
    }
}

fn parse_weekday(code: &str) -> Option<Weekday> {
    match code {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}
