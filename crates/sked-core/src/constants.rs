/// Hard cap on occurrences materialized by a single series expansion.
pub const MAX_SERIES_OCCURRENCES: usize = 200;

/// Notification kinds shared across crates
pub const EVENTS_NOTIFICATION_PREFIX: &str = "events";

pub const EVENTS_CREATED: &str = const_str::concat!(EVENTS_NOTIFICATION_PREFIX, ":created");
pub const EVENTS_CREATED_RECURRING: &str = const_str::concat!(EVENTS_CREATED, ":recurring");

pub const EVENTS_UPDATED: &str = const_str::concat!(EVENTS_NOTIFICATION_PREFIX, ":updated");
pub const EVENTS_UPDATED_RECURRING: &str = const_str::concat!(EVENTS_UPDATED, ":recurring");

/// URN namespace used for generated event identifiers.
pub const NEWSML_URN_PREFIX: &str = "urn:newsml";
