//! Service-level error type for the inventory service.

use thiserror::Error;

use crate::availability::StayError;
use crate::events::PublishError;
use crate::storage::StorageError;

/// Errors surfaced by [`crate::HotelsService`].
///
/// The HTTP layer maps these onto status codes: validation → 400, not found
/// → 404, unavailable → 409, everything else → 500 with details logged
/// rather than echoed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input from the caller.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The hotel has no free room for the requested nights.
    #[error("Hotel not available: {0}")]
    Unavailable(String),

    /// The primary store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Publishing the change event failed after retries.
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

impl ServiceError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

impl From<StayError> for ServiceError {
    fn from(err: StayError) -> Self {
        Self::Validation(err.to_string())
    }
}
