use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sked_core::types::{EventId, RecurrenceId, UserId};
use sked_core::util::datetime::{lenient, lenient_option};
use sked_rrule::RecurringRule;

/// Top-level keys an edit may never overwrite through its pass-through fields.
const PROTECTED_FIELDS: &[&str] = &[
    "_id",
    "guid",
    "recurrence_id",
    "original_creator",
    "version_creator",
    "expiry",
    "dates",
];

/// `dates` block of an event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDates {
    #[serde(with = "lenient")]
    pub start: DateTime<Utc>,
    #[serde(with = "lenient")]
    pub end: DateTime<Utc>,
    /// IANA (or Windows) zone the series is planned in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    #[serde(default)]
    pub recurring_rule: Option<RecurringRule>,
    /// `ex_date`, `ex_rule`, `occur_status` and friends, carried verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventDates {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            tz: None,
            recurring_rule: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_tz(mut self, tz: impl Into<String>) -> Self {
        self.tz = Some(tz.into());
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: RecurringRule) -> Self {
        self.recurring_rule = Some(rule);
        self
    }

    /// `end - start`.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }

    /// A copy moved to `start`, keeping `duration`, with the rule stripped.
    #[must_use]
    pub fn occurrence_at(&self, start: DateTime<Utc>, duration: TimeDelta) -> Self {
        Self {
            start,
            end: start + duration,
            recurring_rule: None,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn tz(&self) -> Option<&str> {
        self.tz.as_deref()
    }
}

/// A persisted event occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: EventId,
    pub guid: EventId,
    #[serde(default)]
    pub recurrence_id: Option<RecurrenceId>,
    pub dates: EventDates,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "lenient_option"
    )]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_creator: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_creator: Option<UserId>,
    /// Descriptive fields (name, category, location, ...) copied verbatim.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    /// Builds an occurrence from a submitted record under the given identity.
    #[must_use]
    pub fn from_draft(draft: &EventDraft, id: EventId) -> Self {
        Self {
            guid: id.clone(),
            id,
            recurrence_id: None,
            dates: draft.dates.clone(),
            expiry: draft.expiry,
            original_creator: draft.original_creator.clone(),
            version_creator: None,
            fields: draft.fields.clone(),
        }
    }

    /// Whether this occurrence belongs to a recurring series.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.recurrence_id.is_some()
    }

    /// ## Summary
    /// Merges a partial edit into this record.
    ///
    /// Identity and series membership are never taken from the edit.
    pub fn apply_update(&mut self, update: &EventUpdate) {
        if let Some(dates) = &update.dates {
            self.dates = dates.clone();
        }
        if update.expiry.is_some() {
            self.expiry = update.expiry;
        }
        if update.version_creator.is_some() {
            self.version_creator.clone_from(&update.version_creator);
        }
        for (key, value) in &update.fields {
            if !PROTECTED_FIELDS.contains(&key.as_str()) {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

/// An event as submitted for creation, before identity is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Client-chosen identifier; kept for non-recurring events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<EventId>,
    pub dates: EventDates,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "lenient_option"
    )]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_creator: Option<UserId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EventDraft {
    #[must_use]
    pub fn new(dates: EventDates) -> Self {
        Self {
            guid: None,
            dates,
            expiry: None,
            original_creator: None,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A partial edit to one occurrence.
///
/// Also the payload handed to [`crate::ports::EventStore::update`] when a
/// reconciliation shifts sibling occurrences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<EventDates>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "lenient_option"
    )]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_creator: Option<UserId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EventUpdate {
    #[must_use]
    pub fn with_dates(mut self, dates: EventDates) -> Self {
        self.dates = Some(dates);
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// A copy without the pass-through keys reserved for identity and dates.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut update = self.clone();
        update
            .fields
            .retain(|key, _| !PROTECTED_FIELDS.contains(&key.as_str()));
        update
    }

    /// The recurrence rule carried by this edit, if any.
    #[must_use]
    pub fn recurring_rule(&self) -> Option<&RecurringRule> {
        self.dates.as_ref()?.recurring_rule.as_ref()
    }
}
