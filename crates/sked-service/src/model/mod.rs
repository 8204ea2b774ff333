//! Event records as exchanged with storage.

mod event;

pub use event::{Event, EventDates, EventDraft, EventUpdate};
