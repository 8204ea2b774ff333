//! Keeps `expiry` in step with the end of an occurrence.

use crate::model::{Event, EventUpdate};

/// ## Summary
/// Overwrites a set `expiry` with `dates.end`. Records without an expiry are left alone.
///
/// Must run after start and end are final.
pub fn derive_expiry(event: &mut Event) {
    if event.expiry.is_some() {
        event.expiry = Some(event.dates.end);
    }
}

/// ## Summary
/// Same rule for an edit about to be applied to `target`: when the stored
/// record carries an expiry, the edit carries the new end as its expiry.
pub fn derive_update_expiry(target: &Event, update: &mut EventUpdate) {
    if target.expiry.is_some() || update.expiry.is_some() {
        let end = update.dates.as_ref().map_or(target.dates.end, |dates| dates.end);
        update.expiry = Some(end);
    }
}
