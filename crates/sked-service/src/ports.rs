//! Collaborators the series engine talks to.
//!
//! Storage, soft deletion, audit history, push notifications and identifier
//! minting all live outside this crate. The engine is synchronous and
//! request-scoped; implementations are expected to present a consistent view
//! of a series for the duration of one call. Concurrent edits to the same
//! series are not coordinated here and must be serialized by the storage layer
//! if stronger guarantees are needed.

use chrono::{DateTime, Utc};
use sked_core::types::{EventId, RecurrenceId};

use crate::error::StoreResult;
use crate::model::{Event, EventUpdate};
use crate::notify::Notification;

/// Which members of a series a lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesFilter {
    All,
    /// Members whose start is at or after the instant.
    StartingFrom(DateTime<Utc>),
    /// Members whose start is strictly after the instant.
    StartingAfter(DateTime<Utc>),
}

impl SeriesFilter {
    #[must_use]
    pub fn matches(self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::StartingFrom(instant) => event.dates.start >= instant,
            Self::StartingAfter(instant) => event.dates.start > instant,
        }
    }
}

/// Persistent event storage.
pub trait EventStore {
    /// ## Summary
    /// Returns the members of a series matching `filter`, ordered by start ascending.
    ///
    /// ## Errors
    /// Returns an error if the backend cannot be queried.
    fn find_series(
        &self,
        recurrence_id: &RecurrenceId,
        filter: SeriesFilter,
    ) -> StoreResult<Vec<Event>>;

    /// ## Summary
    /// Persists new occurrences and returns their identifiers in order.
    ///
    /// ## Errors
    /// Returns an error if any occurrence cannot be stored.
    fn create(&mut self, events: Vec<Event>) -> StoreResult<Vec<EventId>>;

    /// ## Summary
    /// Applies a partial edit to a stored occurrence.
    ///
    /// This is a plain write: it never re-enters series reconciliation.
    ///
    /// ## Errors
    /// Returns `StoreError::NotFound` for an unknown id, or a backend error.
    fn update(&mut self, id: &EventId, update: &EventUpdate) -> StoreResult<()>;

    /// ## Summary
    /// Removes a stored occurrence.
    ///
    /// ## Errors
    /// Returns `StoreError::NotFound` for an unknown id, or a backend error.
    fn delete(&mut self, id: &EventId) -> StoreResult<()>;
}

/// Soft removal of occurrences.
pub trait SpikeService {
    /// ## Summary
    /// Spikes one occurrence. Spiking an already spiked occurrence is a no-op.
    ///
    /// ## Errors
    /// Returns an error if the occurrence cannot be spiked.
    fn spike(&mut self, id: &EventId) -> StoreResult<()>;
}

/// Audit trail hooks. Fire-and-forget.
pub trait HistoryRecorder {
    fn on_created(&mut self, events: &[Event]);
    fn on_deleted(&mut self, event: &Event);
}

/// Push notification delivery. Fire-and-forget.
pub trait Notifier {
    fn emit(&mut self, notification: Notification);
}

/// Source of globally unique identifiers.
pub trait IdGenerator {
    fn new_id(&mut self) -> String;
}
