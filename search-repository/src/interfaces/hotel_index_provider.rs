//! Search index provider trait definition.
//!
//! Abstracts the underlying search backend so the indexer and the search API
//! can be exercised against a mock in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::SearchIndexError;
use crate::types::HotelDocument;

/// Operations the search backend must support.
///
/// Implementations are injected into [`crate::HotelIndexService`]. All
/// operations are idempotent per document id: indexing twice overwrites,
/// updating a missing document creates it, deleting a missing document
/// succeeds.
#[async_trait]
pub trait HotelIndexProvider: Send + Sync {
    /// Ensure the index and its alias exist, creating them if necessary.
    ///
    /// Called once at startup before any document operation.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Write a full document, replacing any previous version.
    ///
    /// Used for CREATE events, where the fetched hotel is the complete truth.
    async fn index_document(&self, document: &HotelDocument) -> Result<(), SearchIndexError>;

    /// Merge a document into the index, creating it if it does not exist.
    ///
    /// Used for UPDATE events. The distinction from [`index_document`] is
    /// that an update leaves unknown fields of an existing document alone.
    ///
    /// [`index_document`]: HotelIndexProvider::index_document
    async fn update_document(&self, document: &HotelDocument) -> Result<(), SearchIndexError>;

    /// Delete a document. A document that does not exist is a success.
    async fn delete_document(&self, hotel_id: &Uuid) -> Result<(), SearchIndexError>;

    /// Full-text search over hotel name and description.
    ///
    /// An empty `query` matches all documents in stable index order.
    /// `offset`/`limit` paginate the hit list. No match returns an empty
    /// vector, never an error.
    async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<HotelDocument>, SearchIndexError>;
}
