//! Loader module: applies processed events to the search index.

use std::sync::Arc;
use tracing::{debug, instrument};

use search_repository::HotelIndexService;

use crate::errors::IngestError;
use crate::processor::ProcessedEvent;

/// Applies index operations through the [`HotelIndexService`].
///
/// Every operation is idempotent per hotel id, so a batch that fails halfway
/// is safe to replay after redelivery.
pub struct SearchLoader {
    index: Arc<HotelIndexService>,
}

impl SearchLoader {
    /// Create a loader over the given index service.
    pub fn new(index: Arc<HotelIndexService>) -> Self {
        Self { index }
    }

    /// Apply a batch of processed events to the index.
    ///
    /// Any failure propagates so the batch is not acknowledged.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn load(&self, events: Vec<ProcessedEvent>) -> Result<(), IngestError> {
        for event in events {
            match event {
                ProcessedEvent::Index(document) => {
                    let hotel_id = document.id;
                    self.index.index(document).await.map_err(|e| {
                        IngestError::loader(format!("Failed to index hotel {}: {}", hotel_id, e))
                    })?;
                    debug!(hotel_id = %hotel_id, "Hotel indexed");
                }
                ProcessedEvent::Update(document) => {
                    let hotel_id = document.id;
                    self.index.update(document).await.map_err(|e| {
                        IngestError::loader(format!("Failed to update hotel {}: {}", hotel_id, e))
                    })?;
                    debug!(hotel_id = %hotel_id, "Hotel updated in index");
                }
                ProcessedEvent::Delete { hotel_id } => {
                    self.index.delete(&hotel_id).await.map_err(|e| {
                        IngestError::loader(format!(
                            "Failed to delete hotel {} from index: {}",
                            hotel_id, e
                        ))
                    })?;
                    debug!(hotel_id = %hotel_id, "Hotel deleted from index");
                }
            }
        }

        Ok(())
    }

    /// Verify the index is reachable and exists.
    pub async fn check_ready(&self) -> Result<(), IngestError> {
        self.index
            .ensure_index_exists()
            .await
            .map_err(|e| IngestError::loader(format!("Search index not ready: {}", e)))
    }
}
