//! Dependency initialization and wiring for the search indexer.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use search_repository::{HotelIndexService, IndexConfig, OpenSearchProvider};

use crate::consumer::KafkaChangeConsumer;
use crate::http::SearchState;
use crate::inventory::HttpHotelFetcher;
use crate::loader::SearchLoader;
use crate::orchestrator::Orchestrator;
use crate::processor::HotelProcessor;
use crate::IndexingError;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default Kafka broker address.
const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
const DEFAULT_KAFKA_GROUP_ID: &str = "search-indexer";

/// Default change-event topic.
const DEFAULT_KAFKA_TOPIC: &str = "hotels-news";

/// Default inventory service base URL.
const DEFAULT_HOTELS_API_URL: &str = "http://localhost:8081";

/// Default index alias.
const DEFAULT_INDEX_ALIAS: &str = "hotels";

/// Default HTTP port for the search API.
const DEFAULT_PORT: u16 = 8082;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if the connection fails.
    FailFast,
    /// Retry the connection until it succeeds.
    Retry,
}

impl ConnectionMode {
    /// Parse the connection mode from `OPENSEARCH_CONNECTION_MODE`.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive); defaults to
    /// "retry".
    fn from_env() -> Self {
        match env::var("OPENSEARCH_CONNECTION_MODE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
    /// State for the search HTTP router.
    pub search_state: SearchState,
    /// HTTP port for the search API.
    pub port: u16,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `INDEX_ALIAS`: index alias name (default: "hotels")
    /// - `INDEX_VERSION`: index version number (default: 0)
    /// - `KAFKA_BROKER`: Kafka broker address (default: localhost:9092)
    /// - `KAFKA_GROUP_ID`: consumer group ID (default: search-indexer)
    /// - `KAFKA_TOPIC`: change-event topic (default: hotels-news)
    /// - `HOTELS_API_URL`: inventory service base URL (default: http://localhost:8081)
    /// - `PORT`: search API port (default: 8082)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: retry interval (default: 15)
    pub async fn new() -> Result<Self, IndexingError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let kafka_broker =
            env::var("KAFKA_BROKER").unwrap_or_else(|_| DEFAULT_KAFKA_BROKER.to_string());
        let kafka_group_id =
            env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| DEFAULT_KAFKA_GROUP_ID.to_string());
        let kafka_topic =
            env::var("KAFKA_TOPIC").unwrap_or_else(|_| DEFAULT_KAFKA_TOPIC.to_string());
        let hotels_api_url =
            env::var("HOTELS_API_URL").unwrap_or_else(|_| DEFAULT_HOTELS_API_URL.to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("OPENSEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);

        let index_alias = env::var("INDEX_ALIAS").unwrap_or_else(|_| DEFAULT_INDEX_ALIAS.to_string());
        let index_version = env::var("INDEX_VERSION")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let index_config = IndexConfig::new(index_alias, index_version);

        info!(
            opensearch_url = %opensearch_url,
            kafka_broker = %kafka_broker,
            kafka_group_id = %kafka_group_id,
            kafka_topic = %kafka_topic,
            hotels_api_url = %hotels_api_url,
            port = port,
            connection_mode = ?connection_mode,
            "Initializing dependencies"
        );

        let provider = Self::connect_to_opensearch(
            &opensearch_url,
            index_config,
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");

        let index = Arc::new(HotelIndexService::new(Box::new(provider)));

        index
            .ensure_index_exists()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure index exists: {}", e)))?;

        let consumer = KafkaChangeConsumer::new(&kafka_broker, &kafka_group_id, &kafka_topic)
            .map_err(|e| IndexingError::config(format!("Failed to create consumer: {}", e)))?;

        info!("Change-event consumer created");

        let fetcher = HttpHotelFetcher::new(hotels_api_url)
            .map_err(|e| IndexingError::config(format!("Failed to create hotel fetcher: {}", e)))?;
        let processor = HotelProcessor::new(Arc::new(fetcher));
        let loader = SearchLoader::new(Arc::clone(&index));

        let orchestrator = Orchestrator::new(Arc::new(consumer), processor, loader);

        Ok(Self {
            orchestrator,
            search_state: SearchState { index },
            port,
        })
    }

    /// Connect to OpenSearch with retry logic based on the connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        loop {
            match OpenSearchProvider::new(url, index_config.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }
}
