use thiserror::Error;

/// Recurrence rule parsing and expansion errors
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid byday value '{value}': {reason}")]
    InvalidByDay { value: String, reason: &'static str },

    #[error("Invalid interval: {0} (must be at least 1)")]
    InvalidInterval(u16),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("RRule validation error: {0}")]
    RRuleValidationError(String),

    #[error(transparent)]
    CoreError(#[from] sked_core::error::CoreError),
}

pub type RuleResult<T> = std::result::Result<T, RuleError>;
