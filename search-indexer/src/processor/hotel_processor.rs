//! Hotel processor implementation.
//!
//! For CREATE and UPDATE events the processor re-fetches the hotel from the
//! inventory service and projects it into a search document; DELETE needs no
//! fetch. The inventory service stays authoritative throughout.

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use booking_shared::{ChangeOperation, HotelChangeEvent};
use search_repository::HotelDocument;

use crate::errors::IngestError;
use crate::inventory::HotelFetcher;

/// Index operation produced from a change event.
#[derive(Debug)]
pub enum ProcessedEvent {
    /// Write the full document (CREATE).
    Index(HotelDocument),
    /// Merge the document, creating it if absent (UPDATE).
    Update(HotelDocument),
    /// Remove the document.
    Delete { hotel_id: Uuid },
}

/// Processor that turns change events into index operations.
pub struct HotelProcessor {
    fetcher: Arc<dyn HotelFetcher>,
}

impl HotelProcessor {
    /// Create a processor backed by the given hotel fetcher.
    pub fn new(fetcher: Arc<dyn HotelFetcher>) -> Self {
        Self { fetcher }
    }

    /// Process a batch of change events.
    ///
    /// A fetch failure aborts the batch so it is redelivered; a hotel that
    /// has disappeared (404) is skipped, since a DELETE event for it is
    /// already on the way.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn process_batch(
        &self,
        events: Vec<HotelChangeEvent>,
    ) -> Result<Vec<ProcessedEvent>, IngestError> {
        let mut processed = Vec::with_capacity(events.len());

        for event in events {
            if let Some(result) = self.process_event(event).await? {
                processed.push(result);
            }
        }

        debug!(processed_count = processed.len(), "Processed event batch");
        Ok(processed)
    }

    /// Process a single change event.
    async fn process_event(
        &self,
        event: HotelChangeEvent,
    ) -> Result<Option<ProcessedEvent>, IngestError> {
        match event.operation {
            ChangeOperation::Create | ChangeOperation::Update => {
                let hotel = match self.fetcher.hotel_by_id(&event.hotel_id).await? {
                    Some(hotel) => hotel,
                    None => {
                        warn!(
                            hotel_id = %event.hotel_id,
                            operation = ?event.operation,
                            "Hotel no longer exists in inventory, skipping event"
                        );
                        return Ok(None);
                    }
                };

                let document = HotelDocument::from(hotel);
                let processed = if event.operation == ChangeOperation::Create {
                    ProcessedEvent::Index(document)
                } else {
                    ProcessedEvent::Update(document)
                };
                Ok(Some(processed))
            }
            ChangeOperation::Delete => Ok(Some(ProcessedEvent::Delete {
                hotel_id: event.hotel_id,
            })),
            ChangeOperation::Unknown => {
                warn!(hotel_id = %event.hotel_id, "Unknown change operation, dropping event");
                Ok(None)
            }
        }
    }
}
