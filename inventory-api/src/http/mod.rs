//! HTTP surface of the inventory service.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::service::HotelsService;

/// Shared state for the inventory router.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<HotelsService>,
    pub jwt_secret: Arc<String>,
}

/// Build the inventory router.
///
/// Public routes serve reads and the availability probe; authenticated
/// routes cover reservations and per-user listings. Hotel CRUD sits behind
/// the admin gate and answers both at the root and under the historical
/// `/admin` prefix.
pub fn create_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/hotels/availability", post(handlers::get_availability))
        .route("/hotels/:hotel_id", get(handlers::get_hotel_by_id))
        .route(
            "/hotels/:hotel_id/reservations",
            get(handlers::get_reservations_by_hotel),
        )
        .route("/health", get(handlers::health));

    let authenticated = Router::new()
        .route("/reservations", post(handlers::create_reservation))
        .route("/reservations/:id", delete(handlers::cancel_reservation))
        .route(
            "/users/:user_id/reservations",
            get(handlers::get_reservations_by_user),
        )
        .route(
            "/users/:user_id/hotels/:hotel_id/reservations",
            get(handlers::get_reservations_by_user_and_hotel),
        )
        .route_layer(middleware::from_fn(auth::logged_user_only))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    let admin = Router::new()
        .route("/hotels", post(handlers::create_hotel))
        .route(
            "/hotels/:hotel_id",
            put(handlers::update_hotel).delete(handlers::delete_hotel),
        )
        .route_layer(middleware::from_fn(auth::admin_only))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    public
        .merge(authenticated)
        .merge(admin.clone())
        .nest("/admin", admin)
        .with_state(state)
}
