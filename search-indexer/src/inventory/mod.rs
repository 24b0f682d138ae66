//! HTTP client for the inventory service.
//!
//! The change-event payload carries only the hotel id; this client resolves
//! it to the full hotel record.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use booking_shared::Hotel;

use crate::errors::IngestError;

/// Default request timeout for inventory calls.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Resolves hotel ids against the authoritative inventory service.
#[async_trait]
pub trait HotelFetcher: Send + Sync {
    /// Fetch a hotel by id. `Ok(None)` means the hotel no longer exists.
    async fn hotel_by_id(&self, hotel_id: &Uuid) -> Result<Option<Hotel>, IngestError>;
}

/// [`HotelFetcher`] over the inventory service's public HTTP API.
pub struct HttpHotelFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHotelFetcher {
    /// Create a fetcher for the given inventory base URL
    /// (e.g. "http://localhost:8081").
    pub fn new(base_url: impl Into<String>) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| IngestError::fetch(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn hotel_url(&self, hotel_id: &Uuid) -> String {
        format!("{}/hotels/{}", self.base_url, hotel_id)
    }
}

#[async_trait]
impl HotelFetcher for HttpHotelFetcher {
    async fn hotel_by_id(&self, hotel_id: &Uuid) -> Result<Option<Hotel>, IngestError> {
        let url = self.hotel_url(hotel_id);
        debug!(url = %url, "Fetching hotel from inventory service");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IngestError::fetch(format!("Error fetching hotel {}: {}", hotel_id, e)))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IngestError::fetch(format!(
                "Failed to fetch hotel {}: received status code {}",
                hotel_id, status
            )));
        }

        let hotel: Hotel = response.json().await.map_err(|e| {
            IngestError::fetch(format!(
                "Error decoding response body for hotel {}: {}",
                hotel_id, e
            ))
        })?;

        Ok(Some(hotel))
    }
}
