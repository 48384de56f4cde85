//! Client error types

use thiserror::Error;

/// Errors returned by [`StoreHandle`](super::StoreHandle) commands
#[derive(Debug, Error)]
pub enum StoreError {
    /// The driver task has stopped
    #[error("Realtime store has shut down")]
    Closed,
}

/// Result type alias for handle commands
pub type StoreResult<T> = Result<T, StoreError>;
