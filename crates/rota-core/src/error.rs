use thiserror::Error;

/// Errors shared by every rota crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting could not be resolved into a usable value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Caller-supplied data that does not describe a real value, such as
    /// February 30th.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
