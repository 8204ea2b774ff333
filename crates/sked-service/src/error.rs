use chrono::{DateTime, Utc};
use sked_core::types::EventId;
use thiserror::Error;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    RuleError(#[from] sked_rrule::error::RuleError),

    #[error(transparent)]
    CoreError(#[from] sked_core::error::CoreError),

    #[error(transparent)]
    StoreError(#[from] StoreError),

    #[error("Recurrence rule starting {start} produces no occurrences")]
    EmptySeries { start: DateTime<Utc> },

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Failures reported by storage and spike collaborators
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Event not found: {0}")]
    NotFound(EventId),

    #[error("Storage error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
