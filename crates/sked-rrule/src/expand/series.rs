//! Occurrence date generation using the `rrule` crate.

use chrono::{DateTime, LocalResult, TimeZone, Utc};
use rrule::{RRule, RRuleSet, Tz, Unvalidated};

use super::timezone::TimeZoneResolver;
use crate::error::{RuleError, RuleResult};
use crate::rule::RecurringRule;

/// Lazy, restartable sequence of occurrence start instants for one rule.
///
/// Instants are evaluated in the series' civil time and yielded in UTC,
/// ascending. The sequence is finite when the rule has a `count` or an
/// `until`; otherwise callers bound it with [`RecurrenceDates::materialize`].
#[derive(Debug, Clone)]
pub struct RecurrenceDates {
    rrule_set: RRuleSet,
    zone: Option<chrono_tz::Tz>,
    until: Option<DateTime<Utc>>,
    count: Option<usize>,
}

/// Occurrence instants materialized under a cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDates {
    pub dates: Vec<DateTime<Utc>>,
    /// The rule would have produced more instants than the cap allowed.
    pub truncated: bool,
}

impl RecurrenceDates {
    /// Iterates the occurrence instants from the first one.
    pub fn iter(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        let until = self.until;
        let zone = self.zone;
        (&self.rrule_set)
            .into_iter()
            .map(move |dt| to_utc(zone, dt))
            .take_while(move |dt| until.is_none_or(|until| *dt <= until))
            .take(self.count.unwrap_or(usize::MAX))
    }

    /// ## Summary
    /// Collects at most `limit` instants, reporting whether any were cut off.
    #[must_use]
    pub fn materialize(&self, limit: usize) -> SeriesDates {
        let mut dates: Vec<_> = self.iter().take(limit.saturating_add(1)).collect();
        let truncated = dates.len() > limit;
        if truncated {
            dates.truncate(limit);
            tracing::warn!(limit, "Recurrence truncated at occurrence limit");
        }
        SeriesDates { dates, truncated }
    }
}

/// Converts a generated wall-clock occurrence to UTC.
///
/// A wall-clock time repeated by a fall-back transition resolves to its
/// standard-time (later) instant.
fn to_utc(zone: Option<chrono_tz::Tz>, dt: DateTime<Tz>) -> DateTime<Utc> {
    if let Some(zone) = zone
        && let LocalResult::Ambiguous(_, standard) = zone.from_local_datetime(&dt.naive_local())
    {
        return standard.with_timezone(&Utc);
    }
    dt.with_timezone(&Utc)
}

/// ## Summary
/// Expands a recurrence rule anchored at `start` into its occurrence instants.
///
/// See [`generate_with_resolver`].
///
/// ## Errors
///
/// Returns an error if the rule is malformed or the timezone is unknown.
pub fn generate(
    start: DateTime<Utc>,
    rule: &RecurringRule,
    tzid: Option<&str>,
) -> RuleResult<RecurrenceDates> {
    let mut resolver = TimeZoneResolver::new();
    generate_with_resolver(start, rule, tzid, &mut resolver)
}

/// ## Summary
/// Expands a recurrence rule anchored at `start` into its occurrence instants,
/// resolving the timezone through `resolver`.
///
/// When `tzid` is given the rule is evaluated in that zone's wall-clock time,
/// so "every Monday at 09:00" stays at 09:00 local across DST transitions.
/// Without a zone the rule is evaluated in UTC. `count` and `until` bound the
/// sequence independently; both are honored if both are set.
///
/// ## Errors
///
/// Returns an error if:
/// - `interval` is zero
/// - `byday` is not a weekday list or a single ordinal weekday
/// - the timezone cannot be resolved
/// - the `rrule` crate rejects the assembled rule
pub fn generate_with_resolver(
    start: DateTime<Utc>,
    rule: &RecurringRule,
    tzid: Option<&str>,
    resolver: &mut TimeZoneResolver,
) -> RuleResult<RecurrenceDates> {
    rule.validate()?;

    let zone = tzid
        .filter(|tzid| !tzid.trim().is_empty())
        .map(|tzid| resolver.resolve(tzid))
        .transpose()?;
    let tz = zone.map_or(Tz::UTC, Tz::Tz);
    let dt_start = start.with_timezone(&tz);

    let mut rrule: RRule<Unvalidated> =
        RRule::new(rule.frequency.to_rrule()).interval(rule.interval);
    if let Some(byday) = rule.parsed_byday()? {
        rrule = rrule.by_weekday(byday.to_rrule());
    }

    let rrule_set = rrule
        .build(dt_start)
        .map_err(|err| RuleError::RRuleValidationError(err.to_string()))?;

    tracing::trace!(
        frequency = %rule.frequency,
        interval = rule.interval,
        count = ?rule.count,
        until = ?rule.until,
        byday = ?rule.byday,
        start = %start,
        tzid = ?tzid,
        "Built recurrence set"
    );

    Ok(RecurrenceDates {
        rrule_set,
        zone,
        until: rule.until,
        count: rule
            .count
            .map(|count| usize::try_from(count).unwrap_or(usize::MAX)),
    })
}
