//! Token claims shared between the identity and inventory services.
//!
//! The identity service signs these claims; the inventory service verifies
//! them. The `tipo` claim name and its `"cliente"` / `"administrador"`
//! values are part of the on-wire contract.

use serde::{Deserialize, Deserializer, Serialize};

/// Role string for regular users.
pub const ROLE_CLIENT: &str = "cliente";

/// Role string for administrators.
pub const ROLE_ADMIN: &str = "administrador";

/// Claim set carried by a session token.
///
/// `user_id` is issued as an integer but historically some clients replay it
/// as a string; verification accepts both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub username: String,
    #[serde(deserialize_with = "int_or_string")]
    pub user_id: i64,
    /// Role claim; wire name preserved for compatibility.
    pub tipo: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

impl TokenClaims {
    pub fn is_admin(&self) -> bool {
        self.tipo == ROLE_ADMIN
    }
}

/// Check a role string against the two accepted values.
pub fn is_valid_role(role: &str) -> bool {
    role == ROLE_CLIENT || role == ROLE_ADMIN
}

fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Float(f64),
        Str(String),
    }

    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(v) => Ok(v),
        IntOrString::Float(v) => Ok(v as i64),
        IntOrString::Str(s) => s.parse::<i64>().map_err(serde::de::Error::custom),
    }
}
