//! Request handlers for the identity routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::domain::{LoginRequest, NewUser, UserUpdate};
use crate::errors::IdentityError;
use crate::http::AppState;

type ErrorBody = (StatusCode, Json<Value>);

fn bad_request(message: impl Into<String>) -> ErrorBody {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
}

/// Map a service error onto a status code.
fn error_response(err: IdentityError) -> ErrorBody {
    match err {
        IdentityError::Validation(msg) => bad_request(msg),
        IdentityError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid credentials" })),
        ),
        IdentityError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "user not found" })),
        ),
        IdentityError::Duplicate(username) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": format!("username {} already exists", username) })),
        ),
        IdentityError::Storage(e) => {
            error!(error = %e, "Storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
        }
        IdentityError::Auth(e) => {
            error!(error = %e, "Credential path failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
        }
    }
}

fn require_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ErrorBody> {
    body.map(|Json(value)| value)
        .map_err(|e| bad_request(format!("invalid request: {}", e)))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "identity-api" }))
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ErrorBody> {
    let request = require_body(body)?;
    let id = state
        .service
        .register(request)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn get_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::domain::User>>, ErrorBody> {
    let users = state.service.get_all().await.map_err(error_response)?;
    Ok(Json(users))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<crate::domain::User>, ErrorBody> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| bad_request("invalid user id"))?;
    let user = state.service.get_by_id(id).await.map_err(error_response)?;
    Ok(Json(user))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Json<Value>, ErrorBody> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| bad_request("invalid user id"))?;
    let request = require_body(body)?;
    state
        .service
        .update(id, request)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "id": id })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ErrorBody> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| bad_request("invalid user id"))?;
    state.service.delete(id).await.map_err(error_response)?;
    Ok(Json(json!({ "message": format!("user {} deleted", id) })))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<crate::domain::LoginResponse>, ErrorBody> {
    let request = require_body(body)?;
    let response = state
        .service
        .login(&request.username, &request.password)
        .await
        .map_err(error_response)?;
    Ok(Json(response))
}
