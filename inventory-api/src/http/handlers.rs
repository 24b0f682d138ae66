//! Request handlers for the inventory routes.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::error;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::http::auth::AuthUser;
use crate::http::AppState;
use crate::service::{NewHotel, NewReservation};
use crate::storage::HotelUpdate;

type ErrorBody = (StatusCode, Json<Value>);

fn bad_request(message: impl Into<String>) -> ErrorBody {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
}

fn forbidden(message: &str) -> ErrorBody {
    (StatusCode::FORBIDDEN, Json(json!({ "error": message })))
}

/// Map a service error onto a status code. Store and bus failures become an
/// opaque 500; the details go to the log, not the client.
fn error_response(err: ServiceError) -> ErrorBody {
    match err {
        ServiceError::Validation(msg) => bad_request(msg),
        ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))),
        ServiceError::Unavailable(msg) => (StatusCode::CONFLICT, Json(json!({ "error": msg }))),
        ServiceError::Storage(e) => {
            error!(error = %e, "Storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
        }
        ServiceError::Publish(e) => {
            error!(error = %e, "Event publish failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
        }
    }
}

fn parse_hotel_id(raw: &str) -> Result<Uuid, ErrorBody> {
    Uuid::parse_str(raw.trim()).map_err(|_| bad_request("invalid hotel id"))
}

/// Unwrap a JSON body, turning any decode rejection into a 400.
fn require_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ErrorBody> {
    body.map(|Json(value)| value)
        .map_err(|e| bad_request(format!("invalid request: {}", e)))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "inventory-api" }))
}

// --- hotels ---

pub async fn get_hotel_by_id(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
) -> Result<Json<booking_shared::Hotel>, ErrorBody> {
    let hotel_id = parse_hotel_id(&hotel_id)?;
    let hotel = state
        .service
        .hotel_by_id(&hotel_id)
        .await
        .map_err(error_response)?;
    Ok(Json(hotel))
}

pub async fn create_hotel(
    State(state): State<AppState>,
    body: Result<Json<NewHotel>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ErrorBody> {
    let request = require_body(body)?;
    let id = state
        .service
        .create_hotel(request)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn update_hotel(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
    body: Result<Json<HotelUpdate>, JsonRejection>,
) -> Result<Json<Value>, ErrorBody> {
    let hotel_id = parse_hotel_id(&hotel_id)?;
    let update = require_body(body)?;
    state
        .service
        .update_hotel(&hotel_id, update)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "id": hotel_id })))
}

pub async fn delete_hotel(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
) -> Result<Json<Value>, ErrorBody> {
    let hotel_id = parse_hotel_id(&hotel_id)?;
    state
        .service
        .delete_hotel(&hotel_id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "id": hotel_id })))
}

// --- availability ---

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub hotel_ids: Vec<Uuid>,
    pub check_in: String,
    pub check_out: String,
}

pub async fn get_availability(
    State(state): State<AppState>,
    body: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> Result<Json<HashMap<Uuid, bool>>, ErrorBody> {
    let request = require_body(body)?;
    let availability = state
        .service
        .availability(request.hotel_ids, &request.check_in, &request.check_out)
        .await
        .map_err(error_response)?;
    Ok(Json(availability))
}

// --- reservations ---

pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    body: Result<Json<NewReservation>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ErrorBody> {
    let request = require_body(body)?;

    if request.user_id != auth.user_id {
        return Err(forbidden("Users can only create reservations for themselves"));
    }

    let reservation = state
        .service
        .create_reservation(request)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": reservation.id }))))
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ErrorBody> {
    let id = Uuid::parse_str(id.trim()).map_err(|_| bad_request("invalid reservation id"))?;

    let reservation = state
        .service
        .reservation_by_id(&id)
        .await
        .map_err(error_response)?;

    if reservation.user_id != auth.user_id {
        return Err(forbidden("Users can only cancel their own reservations"));
    }

    state
        .service
        .cancel_reservation(&id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "message": id })))
}

pub async fn get_reservations_by_hotel(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
) -> Result<Json<Vec<booking_shared::Reservation>>, ErrorBody> {
    let hotel_id = parse_hotel_id(&hotel_id)?;
    let reservations = state
        .service
        .reservations_by_hotel(&hotel_id)
        .await
        .map_err(error_response)?;
    Ok(Json(reservations))
}

pub async fn get_reservations_by_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<booking_shared::Reservation>>, ErrorBody> {
    let user_id = user_id.trim().to_string();
    if auth.user_id != user_id && !auth.is_admin() {
        return Err(forbidden("Users can only list their own reservations"));
    }

    let reservations = state
        .service
        .reservations_by_user(&user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(reservations))
}

pub async fn get_reservations_by_user_and_hotel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, hotel_id)): Path<(String, String)>,
) -> Result<Json<Vec<booking_shared::Reservation>>, ErrorBody> {
    let user_id = user_id.trim().to_string();
    let hotel_id = parse_hotel_id(&hotel_id)?;

    if auth.user_id != user_id && !auth.is_admin() {
        return Err(forbidden("Users can only list their own reservations"));
    }

    let reservations = state
        .service
        .reservations_by_user_and_hotel(&hotel_id, &user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(reservations))
}
