use chrono::{DateTime, Utc};
use sked_core::types::{EventId, RecurrenceId, UserId};
use sked_rrule::expand::TimeZoneResolver;
use sked_rrule::{RecurringRule, generate_with_resolver, normalize};

use super::{CreateOutcome, EventsService};
use crate::error::{ServiceError, ServiceResult};
use crate::expiry::derive_expiry;
use crate::model::{Event, EventDraft};
use crate::notify::created_notifications;
use crate::ports::IdGenerator;

/// Members generated from one recurring draft.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesExpansion {
    pub recurrence_id: RecurrenceId,
    pub occurrences: Vec<Event>,
    pub truncated: bool,
}

/// Records built from one draft, ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDraft {
    pub events: Vec<Event>,
    pub truncated: bool,
}

/// Turns a draft carrying a recurrence rule into its series members.
pub struct SeriesExpander<'a> {
    ids: &'a mut dyn IdGenerator,
    resolver: &'a mut TimeZoneResolver,
    limit: usize,
}

impl<'a> SeriesExpander<'a> {
    #[must_use]
    pub fn new(
        ids: &'a mut dyn IdGenerator,
        resolver: &'a mut TimeZoneResolver,
        limit: usize,
    ) -> Self {
        Self {
            ids,
            resolver,
            limit,
        }
    }

    /// ## Summary
    /// Expands `draft` into one occurrence per generated date.
    ///
    /// Every member is a copy of the draft moved to its date with the original
    /// duration, a fresh identifier, the shared series id and no rule. The
    /// draft itself is not part of the result.
    ///
    /// ## Errors
    /// Returns an error if the draft has no rule, the rule is malformed, the
    /// timezone is unknown or the rule produces no dates.
    pub fn expand(
        &mut self,
        draft: &EventDraft,
        actor: Option<&UserId>,
    ) -> ServiceResult<SeriesExpansion> {
        let rule = draft
            .dates
            .recurring_rule
            .clone()
            .map(normalize)
            .ok_or(ServiceError::InvariantViolation(
                "series expansion requires a recurrence rule",
            ))?;

        let series = self.generate(draft.dates.start, &rule, draft.dates.tz())?;
        let recurrence_id = RecurrenceId::new(self.ids.new_id());
        let duration = draft.dates.duration();
        let creator = draft.original_creator.clone().or_else(|| actor.cloned());

        let occurrences: Vec<Event> = series
            .dates
            .iter()
            .map(|&start| {
                let mut event = Event::from_draft(draft, EventId::new(self.ids.new_id()));
                event.dates = draft.dates.occurrence_at(start, duration);
                event.recurrence_id = Some(recurrence_id.clone());
                event.original_creator.clone_from(&creator);
                derive_expiry(&mut event);
                event
            })
            .collect();

        tracing::debug!(
            recurrence_id = %recurrence_id,
            occurrences = occurrences.len(),
            truncated = series.truncated,
            "Expanded recurring event"
        );

        Ok(SeriesExpansion {
            recurrence_id,
            occurrences,
            truncated: series.truncated,
        })
    }

    /// ## Summary
    /// Materializes the dates of `rule` anchored at `start`, rejecting an empty series.
    ///
    /// ## Errors
    /// Returns an error for a malformed rule, an unknown timezone or no dates.
    pub(super) fn generate(
        &mut self,
        start: DateTime<Utc>,
        rule: &RecurringRule,
        tzid: Option<&str>,
    ) -> ServiceResult<sked_rrule::SeriesDates> {
        let series = generate_with_resolver(start, rule, tzid, self.resolver)?
            .materialize(self.limit);
        if series.dates.is_empty() {
            tracing::warn!(%start, "Recurrence rule produced no occurrences");
            return Err(ServiceError::EmptySeries { start });
        }
        Ok(series)
    }

    /// ## Summary
    /// Builds the records to persist for one submitted draft.
    ///
    /// A draft with a rule becomes its series. Any other draft becomes one
    /// record that keeps a client-supplied `guid` and is credited to `actor`
    /// when it names no creator.
    ///
    /// ## Errors
    /// Same as [`SeriesExpander::expand`].
    pub fn prepare(
        &mut self,
        draft: &EventDraft,
        actor: Option<&UserId>,
    ) -> ServiceResult<PreparedDraft> {
        if draft.dates.recurring_rule.is_some() {
            let expansion = self.expand(draft, actor)?;
            return Ok(PreparedDraft {
                events: expansion.occurrences,
                truncated: expansion.truncated,
            });
        }

        let id = match &draft.guid {
            Some(guid) => guid.clone(),
            None => EventId::new(self.ids.new_id()),
        };
        let mut event = Event::from_draft(draft, id);
        if event.original_creator.is_none() {
            event.original_creator = actor.cloned();
        }
        derive_expiry(&mut event);
        Ok(PreparedDraft {
            events: vec![event],
            truncated: false,
        })
    }

    pub(super) fn new_id(&mut self) -> String {
        self.ids.new_id()
    }
}

impl EventsService<'_> {
    /// ## Summary
    /// Creates events, expanding every draft that carries a recurrence rule
    /// into its series.
    ///
    /// All drafts are prepared before anything is written. Standalone drafts
    /// keep a client-supplied `guid`; series members always get fresh ids.
    ///
    /// ## Errors
    /// Returns an error if any rule is malformed or empty, or if storage fails.
    ///
    /// ## Side Effects
    /// Writes to storage, records history, then emits one created
    /// notification per standalone event and per series.
    #[tracing::instrument(skip(self, drafts), fields(drafts = drafts.len()))]
    pub fn create(
        &mut self,
        drafts: &[EventDraft],
        actor: Option<&UserId>,
    ) -> ServiceResult<CreateOutcome> {
        let mut events = Vec::with_capacity(drafts.len());
        let mut truncated = false;

        {
            let mut expander = self.expander();
            for draft in drafts {
                let prepared = expander.prepare(draft, actor)?;
                truncated |= prepared.truncated;
                events.extend(prepared.events);
            }
        }

        let ids = self.collaborators.store.create(events.clone())?;
        self.collaborators.history.on_created(&events);
        for notification in created_notifications(&events) {
            self.collaborators.notifier.emit(notification);
        }

        tracing::debug!(created = ids.len(), "Created events");

        Ok(CreateOutcome {
            events,
            ids,
            truncated,
        })
    }
}
