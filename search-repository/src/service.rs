//! High-level search index service.
//!
//! Application code uses this instead of a provider directly: it validates
//! input and delegates, keeping the backend swappable for tests.

use tracing::instrument;
use uuid::Uuid;

use crate::config::HotelIndexServiceConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::HotelIndexProvider;
use crate::types::HotelDocument;

/// Validated front door to the hotel search index.
pub struct HotelIndexService {
    provider: Box<dyn HotelIndexProvider>,
    config: HotelIndexServiceConfig,
}

impl HotelIndexService {
    /// Create a service with default configuration (limit capped at 100).
    pub fn new(provider: Box<dyn HotelIndexProvider>) -> Self {
        Self {
            provider,
            config: HotelIndexServiceConfig::default(),
        }
    }

    /// Create a service with custom configuration.
    pub fn with_config(
        provider: Box<dyn HotelIndexProvider>,
        config: HotelIndexServiceConfig,
    ) -> Self {
        Self { provider, config }
    }

    fn validate_document(document: &HotelDocument) -> Result<(), SearchIndexError> {
        if document.id.is_nil() {
            return Err(SearchIndexError::validation("hotel id must not be nil"));
        }
        Ok(())
    }

    fn validate_limit(&self, limit: usize) -> Result<(), SearchIndexError> {
        if limit == 0 {
            return Err(SearchIndexError::validation("limit must be positive"));
        }
        if let Some(max) = self.config.max_limit {
            if limit > max {
                return Err(SearchIndexError::validation(format!(
                    "limit {} exceeds maximum {}",
                    limit, max
                )));
            }
        }
        Ok(())
    }

    /// Ensure the backing index exists. Call once at startup.
    pub async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        self.provider.ensure_index_exists().await
    }

    /// Write a full hotel document (CREATE path).
    #[instrument(skip(self, document), fields(hotel_id = %document.id))]
    pub async fn index(&self, document: HotelDocument) -> Result<(), SearchIndexError> {
        Self::validate_document(&document)?;
        self.provider.index_document(&document).await
    }

    /// Merge a hotel document, creating it if absent (UPDATE path).
    #[instrument(skip(self, document), fields(hotel_id = %document.id))]
    pub async fn update(&self, document: HotelDocument) -> Result<(), SearchIndexError> {
        Self::validate_document(&document)?;
        self.provider.update_document(&document).await
    }

    /// Remove a hotel from the index. Missing documents are a success.
    #[instrument(skip(self))]
    pub async fn delete(&self, hotel_id: &Uuid) -> Result<(), SearchIndexError> {
        if hotel_id.is_nil() {
            return Err(SearchIndexError::validation("hotel id must not be nil"));
        }
        self.provider.delete_document(hotel_id).await
    }

    /// Full-text search over name and description, paginated.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<HotelDocument>, SearchIndexError> {
        self.validate_limit(limit)?;
        self.provider.search(query, offset, limit).await
    }
}
