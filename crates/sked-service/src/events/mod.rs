//! Series expansion and reconciliation over the collaborator ports.

mod align;
mod create;
mod update;

use sked_core::config::RecurrenceConfig;
use sked_core::types::{EventId, RecurrenceId};
use sked_rrule::expand::TimeZoneResolver;

use crate::model::Event;
use crate::ports::{EventStore, HistoryRecorder, IdGenerator, Notifier, SpikeService};

pub use create::{PreparedDraft, SeriesExpander, SeriesExpansion};

/// The external services one operation runs against.
pub struct Collaborators<'a> {
    pub store: &'a mut dyn EventStore,
    pub spikes: &'a mut dyn SpikeService,
    pub history: &'a mut dyn HistoryRecorder,
    pub notifier: &'a mut dyn Notifier,
    pub ids: &'a mut dyn IdGenerator,
}

/// Result of [`EventsService::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    /// Records handed to storage, series members expanded in place of their seed.
    pub events: Vec<Event>,
    /// Identifiers reported by storage, in the same order.
    pub ids: Vec<EventId>,
    /// At least one series was cut off at the occurrence limit.
    pub truncated: bool,
}

/// Result of [`EventsService::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// The edited occurrence with the edit merged in. Persisting it is left to the caller.
    pub event: Event,
    /// Series the edited occurrence belongs to afterwards.
    pub recurrence_id: Option<RecurrenceId>,
    pub created: Vec<EventId>,
    /// Other occurrences that were shifted onto new dates.
    pub updated: Vec<EventId>,
    pub deleted: Vec<EventId>,
    pub spiked: Vec<EventId>,
    pub truncated: bool,
}

impl UpdateOutcome {
    fn new(event: Event) -> Self {
        Self {
            event,
            recurrence_id: None,
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
            spiked: Vec::new(),
            truncated: false,
        }
    }
}

/// Event create and update operations for one request.
pub struct EventsService<'a> {
    collaborators: Collaborators<'a>,
    config: RecurrenceConfig,
    resolver: TimeZoneResolver,
}

impl<'a> EventsService<'a> {
    #[must_use]
    pub fn new(collaborators: Collaborators<'a>, config: RecurrenceConfig) -> Self {
        Self {
            collaborators,
            config,
            resolver: TimeZoneResolver::new(),
        }
    }

    fn expander(&mut self) -> SeriesExpander<'_> {
        SeriesExpander::new(
            &mut *self.collaborators.ids,
            &mut self.resolver,
            self.config.occurrence_limit(),
        )
    }
}
