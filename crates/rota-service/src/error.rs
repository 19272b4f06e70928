use chrono::{DateTime, Utc};
use rota_core::types::RecordId;
use thiserror::Error;

/// Service layer errors: scheduling rule violations plus wrapped lower-layer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    RfcError(#[from] rota_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] rota_core::error::CoreError),

    #[error("Range end {to} is before its start {from}")]
    RangeOrder {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("Occurrence {instance_id} at {starts_at} {reason}")]
    PastOccurrence {
        instance_id: RecordId,
        starts_at: DateTime<Utc>,
        reason: &'static str,
    },

    #[error("Recurrence is disabled")]
    RecurrenceDisabled,

    #[error("Occurrence {0} does not belong to a series")]
    NotInSeries(RecordId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence failure: {0:#}")]
    Persistence(anyhow::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
