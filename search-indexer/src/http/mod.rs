//! Search HTTP API.
//!
//! Serves `GET /search` over the index the ingest keeps up to date, plus a
//! liveness endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use booking_shared::Hotel;
use search_repository::{HotelIndexService, SearchIndexError};

/// Shared state for the search router.
#[derive(Clone)]
pub struct SearchState {
    pub index: Arc<HotelIndexService>,
}

/// Raw query parameters for `GET /search`.
///
/// `offset` and `limit` are kept as strings so a missing or non-integer
/// value can be rejected with 400 instead of being silently defaulted.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: Option<String>,
    offset: Option<String>,
    limit: Option<String>,
}

/// Build the search router.
pub fn create_app(state: SearchState) -> Router {
    Router::new()
        .route("/search", get(search_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "search-indexer" }))
}

fn parse_pagination_param(name: &str, value: Option<&str>) -> Result<usize, (StatusCode, Json<serde_json::Value>)> {
    let raw = value.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("{} is required", name) })),
        )
    })?;
    raw.parse::<usize>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("{} must be a non-negative integer", name) })),
        )
    })
}

async fn search_handler(
    State(state): State<SearchState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Hotel>>, (StatusCode, Json<serde_json::Value>)> {
    let offset = parse_pagination_param("offset", params.offset.as_deref())?;
    let limit = parse_pagination_param("limit", params.limit.as_deref())?;
    let query = params.q.unwrap_or_default();

    match state.index.search(&query, offset, limit).await {
        Ok(documents) => Ok(Json(
            documents.into_iter().map(|doc| doc.into_hotel()).collect(),
        )),
        Err(SearchIndexError::ValidationError(msg)) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": msg })),
        )),
        Err(e) => {
            error!(error = %e, query = %query, "Search failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "error searching hotels" })),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use search_repository::{HotelDocument, HotelIndexProvider};
    use tower::ServiceExt;
    use uuid::Uuid;

    struct StubProvider {
        results: Vec<HotelDocument>,
        fail: bool,
    }

    #[async_trait]
    impl HotelIndexProvider for StubProvider {
        async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn index_document(&self, _document: &HotelDocument) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn update_document(&self, _document: &HotelDocument) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn delete_document(&self, _hotel_id: &Uuid) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn search(
            &self,
            _query: &str,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<HotelDocument>, SearchIndexError> {
            if self.fail {
                return Err(SearchIndexError::search("stub failure"));
            }
            Ok(self.results.clone())
        }
    }

    fn app_with(results: Vec<HotelDocument>, fail: bool) -> Router {
        let provider = StubProvider { results, fail };
        let state = SearchState {
            index: Arc::new(HotelIndexService::new(Box::new(provider))),
        };
        create_app(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn search_returns_matching_hotels() {
        let doc = HotelDocument::from(Hotel::named(Uuid::new_v4(), "Grand Plaza"));
        let app = app_with(vec![doc], false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?q=plaza&offset=0&limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Grand Plaza");
        assert!(body[0].get("avaiable_rooms").is_some());
    }

    #[tokio::test]
    async fn no_match_returns_empty_array() {
        let app = app_with(vec![], false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?q=nothing&offset=0&limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn missing_offset_is_rejected() {
        let app = app_with(vec![], false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?q=plaza&limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_integer_limit_is_rejected() {
        let app = app_with(vec![], false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?q=plaza&offset=0&limit=ten")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn index_failure_maps_to_500() {
        let app = app_with(vec![], true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/search?q=plaza&offset=0&limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = app_with(vec![], false);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
