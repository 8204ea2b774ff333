//! Shared configuration, errors and identifier types for the sked workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod util;
