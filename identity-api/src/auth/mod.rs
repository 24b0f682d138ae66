//! Password hashing and token issuance.

mod password;
mod tokens;

pub use password::{hash_password, verify_password, DEFAULT_BCRYPT_COST};
pub use tokens::{generate_token, verify_token};

use thiserror::Error;

/// Errors from the credential path.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// bcrypt failed.
    #[error("password hashing error: {0}")]
    Hash(String),

    /// Token signing or verification failed.
    #[error("token error: {0}")]
    Token(String),
}
