//! Token-verification middleware and role gates.
//!
//! Extracts `Authorization: Bearer <token>`, verifies the HMAC signature
//! and expiry, and attaches the subject's type and id to the request for
//! downstream handlers. Verification is CPU-bound and never suspends.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::json;

use booking_shared::{TokenClaims, ROLE_ADMIN};

use crate::http::AppState;

/// Authenticated subject attached to the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Role string from the `tipo` claim.
    pub user_type: String,
    /// Subject id, normalized to its decimal string form.
    pub user_id: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user_type == ROLE_ADMIN
    }
}

type Rejection = (StatusCode, Json<serde_json::Value>);

fn unauthorized(message: &str) -> Rejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": message })),
    )
}

/// Verify the bearer token in `headers` and produce the request subject.
///
/// Rejects on: missing header, non-Bearer scheme, missing token, a
/// signature algorithm outside the HMAC family, bad signature, expired
/// token, or missing/unparseable claims.
pub fn verify_bearer(headers: &HeaderMap, secret: &str) -> Result<AuthUser, Rejection> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Authorization header missing"))?;

    let mut parts = header.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => {
            return Err(unauthorized(
                "Authorization header format must be Bearer {token}",
            ))
        }
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(unauthorized(
            "Authorization header format must be Bearer {token}",
        ));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

    let data = jsonwebtoken::decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| unauthorized("Invalid token"))?;

    Ok(AuthUser {
        user_type: data.claims.tipo,
        user_id: data.claims.user_id.to_string(),
    })
}

/// Middleware: authenticate the request and attach [`AuthUser`].
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match verify_bearer(request.headers(), &state.jwt_secret) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Middleware: require any authenticated subject.
pub async fn logged_user_only(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthUser>().is_none() {
        return unauthorized("Authentication required").into_response();
    }
    next.run(request).await
}

/// Middleware: require the admin role.
pub async fn admin_only(request: Request, next: Next) -> Response {
    match request.extensions().get::<AuthUser>() {
        None => unauthorized("User type not found").into_response(),
        Some(user) if !user.is_admin() => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Forbidden: Administrators only" })),
        )
            .into_response(),
        Some(_) => next.run(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use booking_shared::ROLE_CLIENT;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token_with(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims(tipo: &str, user_id: i64) -> serde_json::Value {
        let now = Utc::now().timestamp();
        json!({
            "username": "ana",
            "user_id": user_id,
            "tipo": tipo,
            "iat": now,
            "exp": now + 3600,
        })
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        headers
    }

    #[test]
    fn valid_token_produces_subject() {
        let token = token_with(&valid_claims(ROLE_CLIENT, 42), SECRET);
        let user = verify_bearer(&headers_with(&token), SECRET).unwrap();
        assert_eq!(user.user_type, ROLE_CLIENT);
        assert_eq!(user.user_id, "42");
        assert!(!user.is_admin());
    }

    #[test]
    fn string_user_id_claim_is_accepted() {
        let now = Utc::now().timestamp();
        let claims = json!({
            "username": "ana",
            "user_id": "42",
            "tipo": ROLE_ADMIN,
            "iat": now,
            "exp": now + 3600,
        });
        let token = token_with(&claims, SECRET);
        let user = verify_bearer(&headers_with(&token), SECRET).unwrap();
        assert_eq!(user.user_id, "42");
        assert!(user.is_admin());
    }

    #[test]
    fn missing_header_is_rejected() {
        let result = verify_bearer(&HeaderMap::new(), SECRET);
        assert_eq!(result.unwrap_err().0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(verify_bearer(&headers, SECRET).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer".parse().unwrap());
        assert!(verify_bearer(&headers, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = token_with(&valid_claims(ROLE_CLIENT, 42), "other-secret");
        assert!(verify_bearer(&headers_with(&token), SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = json!({
            "username": "ana",
            "user_id": 42,
            "tipo": ROLE_CLIENT,
            "iat": now - 7200,
            "exp": now - 3600,
        });
        let token = token_with(&claims, SECRET);
        assert!(verify_bearer(&headers_with(&token), SECRET).is_err());
    }

    #[test]
    fn missing_tipo_claim_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = json!({
            "username": "ana",
            "user_id": 42,
            "iat": now,
            "exp": now + 3600,
        });
        let token = token_with(&claims, SECRET);
        assert!(verify_bearer(&headers_with(&token), SECRET).is_err());
    }

    #[test]
    fn missing_user_id_claim_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = json!({
            "username": "ana",
            "tipo": ROLE_CLIENT,
            "iat": now,
            "exp": now + 3600,
        });
        let token = token_with(&claims, SECRET);
        assert!(verify_bearer(&headers_with(&token), SECRET).is_err());
    }
}
