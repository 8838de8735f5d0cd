//! Record store errors.

use thiserror::Error;

/// Failure of a record store backend.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend refused or dropped the operation.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer in time.
    #[error("record store timed out")]
    Timeout,
}

/// Result type for record store operations.
pub type CacheResult<T> = Result<T, CacheError>;
