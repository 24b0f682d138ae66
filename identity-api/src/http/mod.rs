//! HTTP surface of the identity service.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::service::UsersService;

/// Shared state for the identity router.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<UsersService>,
}

/// Build the identity router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/users", post(handlers::register).get(handlers::get_all))
        .route(
            "/users/:id",
            get(handlers::get_by_id)
                .put(handlers::update)
                .delete(handlers::delete),
        )
        .route("/login", post(handlers::login))
        .route("/health", get(handlers::health))
        .with_state(state)
}
