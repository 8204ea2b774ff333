//! Positional alignment of existing occurrences with target dates.
//!
//! Index `i` of the existing set pairs with index `i` of the targets. Dates
//! are not matched by proximity, so the result is only meaningful when both
//! sequences come from comparable rules.

use chrono::{DateTime, Utc};

use crate::model::Event;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Pairing<'e> {
    /// Move an existing occurrence onto a target date.
    Update {
        existing: &'e Event,
        at: DateTime<Utc>,
    },
    /// A target date with no existing occurrence left.
    Create { at: DateTime<Utc> },
    /// An existing occurrence with no target date left.
    Delete { existing: &'e Event },
}

pub(super) fn align<'e>(existing: &'e [Event], targets: &[DateTime<Utc>]) -> Vec<Pairing<'e>> {
    (0..existing.len().max(targets.len()))
        .filter_map(|index| match (existing.get(index), targets.get(index)) {
            (Some(existing), Some(&at)) => Some(Pairing::Update { existing, at }),
            (None, Some(&at)) => Some(Pairing::Create { at }),
            (Some(existing), None) => Some(Pairing::Delete { existing }),
            (None, None) => None,
        })
        .collect()
}
