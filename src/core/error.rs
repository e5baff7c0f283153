//! Domain error types shared by the services.

use thiserror::Error;

/// Errors surfaced by the conversion, paging and aggregation services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Currency code is not present in the currency catalog.
    #[error("invalid currency code: {0}")]
    InvalidCode(String),

    /// Currency code is well-formed but absent from the exchange-rate table.
    #[error("currency not found: {0}")]
    CurrencyNotFound(String),

    /// Converted amount does not fit the decimal range.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),

    /// Upstream dataset could not be fetched and nothing is cached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Waiting for a request permit was interrupted.
    #[error("interrupted while waiting for a request permit")]
    InterruptedWait,

    /// The task pool queue is full.
    #[error("task pool is saturated")]
    PoolSaturated,

    /// A pooled task panicked or was cancelled.
    #[error("pooled task failed: {0}")]
    TaskFailed(String),
}

impl ServiceError {
    /// HTTP status an API front end would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::InvalidCode(_) | ServiceError::AmountOutOfRange(_) => 400,
            ServiceError::CurrencyNotFound(_) => 404,
            ServiceError::Unavailable(_) | ServiceError::PoolSaturated => 503,
            ServiceError::InterruptedWait | ServiceError::TaskFailed(_) => 500,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
