//! Recurrence rules for planning events: the rule model, termination-mode
//! normalization and expansion of a rule into concrete occurrence instants.

pub mod error;
pub mod expand;
pub mod rule;

pub use expand::{RecurrenceDates, SeriesDates, generate, generate_with_resolver};
pub use rule::{ByDay, EndRepeatMode, Frequency, RecurringRule, normalize};
