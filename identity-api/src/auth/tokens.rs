//! Session token issuance (HS256).
//!
//! The claim set is the shared contract with the inventory service:
//! `username`, `user_id`, `tipo`, `iat`, `exp`.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;

use booking_shared::TokenClaims;

use super::AuthError;

/// Sign a session token for a user.
pub fn generate_token(
    username: &str,
    user_id: i64,
    tipo: &str,
    secret: &str,
    duration: Duration,
) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::Token("jwt secret is required".to_string()));
    }
    if duration.is_zero() {
        return Err(AuthError::Token("jwt duration must be positive".to_string()));
    }

    let now = Utc::now();
    let claims = TokenClaims {
        username: username.to_string(),
        user_id,
        tipo: tipo.to_string(),
        iat: now.timestamp(),
        exp: (now + chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::hours(24)))
            .timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Token(format!("jwt encode: {e}")))
}

/// Verify a token and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AuthError::Token(format!("jwt decode: {e}")))
}
