//! Error types for the search indexer ingest.

use thiserror::Error;

/// Errors that can occur in the ingest flow.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error applying operations to the search index.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Queue-related error.
    #[error("Kafka error: {0}")]
    KafkaError(String),

    /// Error parsing or decoding a message payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to fetch a hotel from the inventory service.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Channel communication error.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl IngestError {
    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }

    /// Create a Kafka error.
    pub fn kafka(msg: impl Into<String>) -> Self {
        Self::KafkaError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::FetchError(msg.into())
    }
}

impl From<rdkafka::error::KafkaError> for IngestError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        Self::KafkaError(err.to_string())
    }
}
