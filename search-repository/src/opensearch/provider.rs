//! OpenSearch implementation of [`HotelIndexProvider`].

use async_trait::async_trait;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesPutAliasParts},
    DeleteParts, IndexParts, OpenSearch, SearchParts, UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use crate::errors::SearchIndexError;
use crate::interfaces::HotelIndexProvider;
use crate::opensearch::index_config::{get_index_settings, IndexConfig};
use crate::types::HotelDocument;

/// OpenSearch-backed hotel index.
///
/// Writes go to the configured alias, which points at a versioned physical
/// index created on startup by [`ensure_index_exists`].
///
/// [`ensure_index_exists`]: HotelIndexProvider::ensure_index_exists
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new provider connected to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g. "http://localhost:9200")
    /// * `index_config` - Alias and version of the hotel index
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            alias = %index_config.alias,
            version = index_config.version,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Build the query body for a search request.
    ///
    /// An empty query matches everything; otherwise the query string is
    /// matched against name OR description.
    fn search_body(query: &str) -> Value {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            json!({ "query": { "match_all": {} } })
        } else {
            json!({
                "query": {
                    "multi_match": {
                        "query": trimmed,
                        "fields": ["name", "description"]
                    }
                }
            })
        }
    }
}

#[async_trait]
impl HotelIndexProvider for OpenSearchProvider {
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let index_name = self.index_config.index_name();

        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[&index_name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !exists.status_code().is_success() {
            info!(index = %index_name, "Creating search index");

            let response = self
                .client
                .indices()
                .create(IndicesCreateParts::Index(&index_name))
                .body(get_index_settings())
                .send()
                .await
                .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

            let status = response.status_code();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SearchIndexError::index_creation(format!(
                    "Index creation failed with status {}: {}",
                    status, body
                )));
            }
        }

        // Point the alias at the versioned index. Re-putting an existing
        // alias is a no-op on the backend side.
        let response = self
            .client
            .indices()
            .put_alias(IndicesPutAliasParts::IndexName(
                &[&index_name],
                &self.index_config.alias,
            ))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchIndexError::index_creation(format!(
                "Alias creation failed with status {}: {}",
                status, body
            )));
        }

        info!(
            index = %index_name,
            alias = %self.index_config.alias,
            "Search index ready"
        );
        Ok(())
    }

    async fn index_document(&self, document: &HotelDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();

        let response = self
            .client
            .index(IndexParts::IndexId(&self.index_config.alias, &doc_id))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, body
            )));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    async fn update_document(&self, document: &HotelDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();

        let response = self
            .client
            .update(UpdateParts::IndexId(&self.index_config.alias, &doc_id))
            .body(json!({
                "doc": document,
                "doc_as_upsert": true
            }))
            .send()
            .await
            .map_err(|e| SearchIndexError::update(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Update request failed");
            return Err(SearchIndexError::update(format!(
                "Update failed with status {}: {}",
                status, body
            )));
        }

        debug!(doc_id = %doc_id, "Document updated");
        Ok(())
    }

    async fn delete_document(&self, hotel_id: &Uuid) -> Result<(), SearchIndexError> {
        let doc_id = hotel_id.to_string();

        let response = self
            .client
            .delete(DeleteParts::IndexId(&self.index_config.alias, &doc_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();
        // 404 means the document was already gone, which is fine.
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, body
            )));
        }

        debug!(doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<HotelDocument>, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[&self.index_config.alias]))
            .from(offset as i64)
            .size(limit as i64)
            .body(Self::search_body(query))
            .send()
            .await
            .map_err(|e| SearchIndexError::search(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Search request failed");
            return Err(SearchIndexError::search(format!(
                "Search failed with status {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let hits = body["hits"]["hits"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut documents = Vec::with_capacity(hits.len());
        for hit in hits {
            match serde_json::from_value::<HotelDocument>(hit["_source"].clone()) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    // A malformed document should not take down the whole
                    // result page; log it and keep going.
                    error!(error = %e, "Skipping unparseable search hit");
                }
            }
        }

        debug!(
            query = %query,
            offset = offset,
            limit = limit,
            hit_count = documents.len(),
            "Search executed"
        );
        Ok(documents)
    }
}
