//! Service-level error type for the identity service.

use thiserror::Error;

use crate::auth::AuthError;
use crate::storage::StorageError;

/// Errors surfaced by [`crate::UsersService`].
///
/// The HTTP layer maps these onto status codes: validation → 400, invalid
/// credentials → 401, not found → 404, duplicate → 409, the rest → 500.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Invalid input from the caller.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown user or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The username is already taken.
    #[error("username {0} already exists")]
    Duplicate(String),

    /// The user does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The primary store failed.
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Hashing or token issuance failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl IdentityError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<StorageError> for IdentityError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(subject) => Self::NotFound(subject),
            StorageError::Duplicate(username) => Self::Duplicate(username),
            other => Self::Storage(other),
        }
    }
}
