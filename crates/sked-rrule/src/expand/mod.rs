//! Expansion of recurrence rules into occurrence instants.
//!
//! Rules are evaluated in the series' local civil time and converted back to
//! UTC, which keeps wall-clock times stable across daylight-saving changes.

mod series;
mod timezone;

pub use series::{RecurrenceDates, SeriesDates, generate, generate_with_resolver};
pub use timezone::TimeZoneResolver;
