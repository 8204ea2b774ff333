use sked_core::types::{EventId, RecurrenceId, UserId};
use sked_rrule::normalize;

use super::align::{Pairing, align};
use super::{EventsService, UpdateOutcome};
use crate::error::{ServiceError, ServiceResult};
use crate::expiry::{derive_expiry, derive_update_expiry};
use crate::model::{Event, EventDates, EventUpdate};
use crate::notify::{Notification, NotificationKind};
use crate::ports::SeriesFilter;

impl EventsService<'_> {
    /// ## Summary
    /// Applies an edit to one occurrence and reconciles its series.
    ///
    /// Without a rule in `updates` the occurrence becomes standalone and every
    /// later member of its former series is spiked. With a rule, the series is
    /// re-derived from this occurrence forward: existing members from
    /// `original` on are aligned by position with the new dates and are
    /// shifted, deleted or supplemented accordingly.
    ///
    /// The returned [`UpdateOutcome::event`] is `original` with the edit merged
    /// in; the caller persists it.
    ///
    /// ## Errors
    /// Returns an error if the rule is malformed or produces no dates, or if
    /// a collaborator fails. Writes applied before a collaborator failure are
    /// not rolled back.
    #[tracing::instrument(skip(self, original, updates, actor), fields(
        event_id = %original.id,
        recurrence_id = ?original.recurrence_id,
        recurring = updates.recurring_rule().is_some(),
    ))]
    pub fn update(
        &mut self,
        original: &Event,
        updates: &EventUpdate,
        actor: Option<&UserId>,
    ) -> ServiceResult<UpdateOutcome> {
        let updates = updates.sanitized();
        match updates.dates.as_ref().filter(|dates| dates.recurring_rule.is_some()) {
            Some(dates) => self.reconcile_series(original, &updates, dates, actor),
            None => self.detach_from_series(original, &updates, actor),
        }
    }

    fn detach_from_series(
        &mut self,
        original: &Event,
        updates: &EventUpdate,
        actor: Option<&UserId>,
    ) -> ServiceResult<UpdateOutcome> {
        let mut event = merged(original, updates, actor);
        event.recurrence_id = None;
        derive_expiry(&mut event);

        let mut outcome = UpdateOutcome::new(event);

        if let Some(recurrence_id) = &original.recurrence_id {
            let later = self
                .collaborators
                .store
                .find_series(recurrence_id, SeriesFilter::StartingAfter(original.dates.start))?;
            for sibling in later.iter().filter(|sibling| sibling.id != original.id) {
                self.collaborators.spikes.spike(&sibling.id)?;
                outcome.spiked.push(sibling.id.clone());
            }
            tracing::debug!(
                recurrence_id = %recurrence_id,
                spiked = outcome.spiked.len(),
                "Detached occurrence from series"
            );
        }

        self.collaborators.notifier.emit(
            Notification::new(NotificationKind::Updated, original.id.as_str())
                .with_user(actor.cloned()),
        );

        Ok(outcome)
    }

    fn reconcile_series(
        &mut self,
        original: &Event,
        updates: &EventUpdate,
        dates: &EventDates,
        actor: Option<&UserId>,
    ) -> ServiceResult<UpdateOutcome> {
        let rule = dates
            .recurring_rule
            .clone()
            .map(normalize)
            .ok_or(ServiceError::InvariantViolation(
                "series reconciliation requires a recurrence rule",
            ))?;

        let (recurrence_id, targets) = {
            let mut expander = self.expander();
            let targets = expander.generate(dates.start, &rule, dates.tz())?;
            let recurrence_id = match &original.recurrence_id {
                Some(recurrence_id) => recurrence_id.clone(),
                None => RecurrenceId::new(expander.new_id()),
            };
            (recurrence_id, targets)
        };

        let existing = self.comparison_set(original, &recurrence_id)?;
        let duration = dates.duration();

        let mut event = merged(original, updates, actor);
        event.recurrence_id = Some(recurrence_id.clone());
        event.dates = dates.occurrence_at(dates.start, duration);

        let mut outcome = UpdateOutcome::new(event);
        outcome.recurrence_id = Some(recurrence_id.clone());
        outcome.truncated = targets.truncated;

        let mut new_members = Vec::new();
        for pairing in align(&existing, &targets.dates) {
            match pairing {
                Pairing::Update { existing, at } if existing.id == original.id => {
                    outcome.event.dates = dates.occurrence_at(at, duration);
                }
                Pairing::Update { existing, at } => {
                    let shifted = dates.occurrence_at(at, duration);
                    self.apply_date_shift(existing, updates, shifted, actor)?;
                    outcome.updated.push(existing.id.clone());
                }
                Pairing::Create { at } => {
                    let id = EventId::new(self.collaborators.ids.new_id());
                    let mut member = merged(original, updates, actor);
                    member.guid = id.clone();
                    member.id = id;
                    member.recurrence_id = Some(recurrence_id.clone());
                    member.dates = dates.occurrence_at(at, duration);
                    derive_expiry(&mut member);
                    tracing::trace!(event_id = %member.id, start = %at, "New series member");
                    new_members.push(member);
                }
                Pairing::Delete { existing } => {
                    self.collaborators.store.delete(&existing.id)?;
                    self.collaborators.history.on_deleted(existing);
                    outcome.deleted.push(existing.id.clone());
                }
            }
        }

        derive_expiry(&mut outcome.event);

        if !new_members.is_empty() {
            outcome.created = self.collaborators.store.create(new_members.clone())?;
            self.collaborators.history.on_created(&new_members);
        }

        tracing::debug!(
            recurrence_id = %recurrence_id,
            created = outcome.created.len(),
            updated = outcome.updated.len(),
            deleted = outcome.deleted.len(),
            truncated = outcome.truncated,
            "Reconciled series"
        );

        self.collaborators.notifier.emit(
            Notification::new(NotificationKind::UpdatedRecurring, original.id.as_str())
                .with_recurrence_id(recurrence_id)
                .with_user(actor.cloned()),
        );

        Ok(outcome)
    }

    /// Members compared against the new dates, ordered by start.
    fn comparison_set(
        &self,
        original: &Event,
        recurrence_id: &RecurrenceId,
    ) -> ServiceResult<Vec<Event>> {
        if !original.is_recurring() {
            return Ok(vec![original.clone()]);
        }

        let mut existing = self
            .collaborators
            .store
            .find_series(recurrence_id, SeriesFilter::StartingFrom(original.dates.start))?;
        existing.sort_by_key(|event| event.dates.start);

        if !existing.iter().any(|event| event.id == original.id) {
            tracing::warn!(
                event_id = %original.id,
                "Edited occurrence missing from its series, aligning it first"
            );
            existing.insert(0, original.clone());
        }
        Ok(existing)
    }

    /// Moves a sibling onto a new date as a plain storage write.
    ///
    /// Never routes back through [`EventsService::update`], so shifting one
    /// member cannot trigger another reconciliation.
    fn apply_date_shift(
        &mut self,
        sibling: &Event,
        updates: &EventUpdate,
        dates: EventDates,
        actor: Option<&UserId>,
    ) -> ServiceResult<()> {
        let start = dates.start;
        let mut shift = EventUpdate {
            dates: Some(dates),
            version_creator: actor.cloned(),
            ..updates.clone()
        };
        derive_update_expiry(sibling, &mut shift);

        tracing::trace!(event_id = %sibling.id, %start, "Shifting series member");
        self.collaborators.store.update(&sibling.id, &shift)?;
        Ok(())
    }
}

/// `original` with the edit applied and the acting user stamped.
fn merged(original: &Event, updates: &EventUpdate, actor: Option<&UserId>) -> Event {
    let mut event = original.clone();
    event.apply_update(updates);
    if let Some(actor) = actor {
        event.version_creator = Some(actor.clone());
    }
    event.dates.recurring_rule = None;
    event
}
