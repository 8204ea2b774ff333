//! Push notifications emitted after series writes.

use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};
use sked_core::constants::{
    EVENTS_CREATED, EVENTS_CREATED_RECURRING, EVENTS_UPDATED, EVENTS_UPDATED_RECURRING,
};
use sked_core::types::{RecurrenceId, UserId};

use crate::model::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Created,
    CreatedRecurring,
    Updated,
    UpdatedRecurring,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => EVENTS_CREATED,
            Self::CreatedRecurring => EVENTS_CREATED_RECURRING,
            Self::Updated => EVENTS_UPDATED,
            Self::UpdatedRecurring => EVENTS_UPDATED_RECURRING,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NotificationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One push message.
///
/// `item` is an event id for per-occurrence kinds and the originating item
/// for series-level kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<RecurrenceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
}

impl Notification {
    #[must_use]
    pub fn new(kind: NotificationKind, item: impl Into<String>) -> Self {
        Self {
            kind,
            item: item.into(),
            recurrence_id: None,
            user: None,
        }
    }

    #[must_use]
    pub fn with_recurrence_id(mut self, recurrence_id: RecurrenceId) -> Self {
        self.recurrence_id = Some(recurrence_id);
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: Option<UserId>) -> Self {
        self.user = user;
        self
    }
}

/// ## Summary
/// Builds the notifications for a batch of freshly created events.
///
/// Standalone events get one `events:created` each. A series gets a single
/// `events:created:recurring` however many occurrences it has.
#[must_use]
pub fn created_notifications(events: &[Event]) -> Vec<Notification> {
    let mut seen_series: HashSet<&RecurrenceId> = HashSet::new();
    let mut notifications = Vec::new();

    for event in events {
        match &event.recurrence_id {
            Some(recurrence_id) => {
                if seen_series.insert(recurrence_id) {
                    notifications.push(
                        Notification::new(NotificationKind::CreatedRecurring, recurrence_id.as_str())
                            .with_recurrence_id(recurrence_id.clone())
                            .with_user(event.original_creator.clone()),
                    );
                }
            }
            None => notifications.push(
                Notification::new(NotificationKind::Created, event.id.as_str())
                    .with_user(event.original_creator.clone()),
            ),
        }
    }

    notifications
}
