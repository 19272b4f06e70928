use rota_core::error::CoreError;
use thiserror::Error;

use crate::rfc::recur::Frequency;

/// Recurrence rule parsing, validation and expansion errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Malformed recurrence rule: {0}")]
    MalformedRule(String),

    #[error("Invalid interval {interval} for {frequency} recurrence (allowed 1..={max})")]
    InvalidInterval {
        frequency: Frequency,
        interval: u32,
        max: u32,
    },

    #[error("Recurrence rule has no UNTIL bound")]
    UnboundedRule,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Expansion exceeded maximum limit of {0} occurrences")]
    TooManyOccurrences(u16),

    #[error("Expansion failed: {0}")]
    Expansion(String),

    #[error(transparent)]
    CoreError(#[from] CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
