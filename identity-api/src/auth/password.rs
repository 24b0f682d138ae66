//! Password hashing via bcrypt.

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt at the given cost (0 means the default).
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let cost = if cost == 0 { DEFAULT_BCRYPT_COST } else { cost };
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hash(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Hash(format!("bcrypt verify: {e}")))
}
