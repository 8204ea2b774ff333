//! Planning event series: expansion of recurring events into occurrences on
//! create, and reconciliation of existing occurrences on edit.

pub mod error;
pub mod events;
pub mod expiry;
pub mod identity;
pub mod model;
pub mod notify;
pub mod ports;
