//! Sked integration test support.
//!
//! In-memory stand-ins for the collaborators the series engine writes to,
//! plus a harness wiring them into an [`EventsService`].

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use sked_core::config::RecurrenceConfig;
use sked_core::types::{EventId, RecurrenceId};
use sked_service::error::{StoreError, StoreResult};
use sked_service::events::{Collaborators, EventsService};
use sked_service::model::{Event, EventDates, EventDraft, EventUpdate};
use sked_service::notify::{Notification, NotificationKind};
use sked_service::ports::{
    EventStore, HistoryRecorder, IdGenerator, Notifier, SeriesFilter, SpikeService,
};

pub use sked_core;
pub use sked_rrule;
pub use sked_service;

/// Event storage backed by a map keyed on `_id`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: BTreeMap<EventId, Event>,
    /// Fail every write once this many have succeeded.
    fail_after_writes: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write after the first `writes` fail with a backend error.
    #[must_use]
    pub const fn failing_after(mut self, writes: usize) -> Self {
        self.fail_after_writes = Some(writes);
        self
    }

    /// Stores or replaces a record as the CRUD layer would.
    pub fn put(&mut self, event: Event) {
        self.events.insert(event.id.clone(), event);
    }

    #[must_use]
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All members of a series, ordered by start.
    #[must_use]
    pub fn series(&self, recurrence_id: &RecurrenceId) -> Vec<Event> {
        self.matching(recurrence_id, SeriesFilter::All)
    }

    fn matching(&self, recurrence_id: &RecurrenceId, filter: SeriesFilter) -> Vec<Event> {
        let mut members: Vec<Event> = self
            .events
            .values()
            .filter(|event| event.recurrence_id.as_ref() == Some(recurrence_id))
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        members.sort_by_key(|event| event.dates.start);
        members
    }

    fn record_write(&mut self) -> StoreResult<()> {
        if self
            .fail_after_writes
            .is_some_and(|limit| self.writes >= limit)
        {
            return Err(anyhow::anyhow!("write limit of {} reached", self.writes).into());
        }
        self.writes += 1;
        Ok(())
    }
}

impl EventStore for MemoryStore {
    fn find_series(
        &self,
        recurrence_id: &RecurrenceId,
        filter: SeriesFilter,
    ) -> StoreResult<Vec<Event>> {
        Ok(self.matching(recurrence_id, filter))
    }

    fn create(&mut self, events: Vec<Event>) -> StoreResult<Vec<EventId>> {
        self.record_write()?;
        let ids = events.iter().map(|event| event.id.clone()).collect();
        for event in events {
            self.put(event);
        }
        Ok(ids)
    }

    fn update(&mut self, id: &EventId, update: &EventUpdate) -> StoreResult<()> {
        self.record_write()?;
        let event = self
            .events
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        event.apply_update(update);
        Ok(())
    }

    fn delete(&mut self, id: &EventId) -> StoreResult<()> {
        self.record_write()?;
        self.events
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(())
    }
}

/// Records spiked ids, once each.
#[derive(Debug, Default)]
pub struct RecordingSpikes {
    pub spiked: Vec<EventId>,
}

impl SpikeService for RecordingSpikes {
    fn spike(&mut self, id: &EventId) -> StoreResult<()> {
        if !self.spiked.contains(id) {
            self.spiked.push(id.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingHistory {
    pub created: Vec<EventId>,
    pub deleted: Vec<EventId>,
}

impl HistoryRecorder for RecordingHistory {
    fn on_created(&mut self, events: &[Event]) {
        self.created.extend(events.iter().map(|event| event.id.clone()));
    }

    fn on_deleted(&mut self, event: &Event) {
        self.deleted.push(event.id.clone());
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notifications: Vec<Notification>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn of_kind(&self, kind: NotificationKind) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|notification| notification.kind == kind)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn emit(&mut self, notification: Notification) {
        tracing::trace!(kind = %notification.kind, item = %notification.item, "Notification");
        self.notifications.push(notification);
    }
}

/// Predictable ids: `id-1`, `id-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: usize,
}

impl IdGenerator for SequentialIds {
    fn new_id(&mut self) -> String {
        self.next += 1;
        format!("id-{}", self.next)
    }
}

/// One set of collaborators shared by the operations of a test.
#[derive(Debug, Default)]
pub struct Harness {
    pub store: MemoryStore,
    pub spikes: RecordingSpikes,
    pub history: RecordingHistory,
    pub notifier: RecordingNotifier,
    pub ids: SequentialIds,
    pub config: RecurrenceConfig,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub const fn with_max_occurrences(mut self, max_occurrences: usize) -> Self {
        self.config.max_occurrences = max_occurrences;
        self
    }

    #[must_use]
    pub fn service(&mut self) -> EventsService<'_> {
        EventsService::new(
            Collaborators {
                store: &mut self.store,
                spikes: &mut self.spikes,
                history: &mut self.history,
                notifier: &mut self.notifier,
                ids: &mut self.ids,
            },
            self.config.clone(),
        )
    }
}

/// A one-hour draft starting at `start`.
#[must_use]
pub fn draft_at(start: DateTime<Utc>) -> EventDraft {
    EventDraft::new(EventDates::new(start, start + TimeDelta::hours(1)))
        .with_field("name", "Editorial meeting")
        .with_field("calendars", serde_json::json!([{"qcode": "sport"}]))
}
