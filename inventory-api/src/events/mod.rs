//! Change-event publisher for the message bus.
//!
//! Wraps an `rdkafka` producer behind the publish policy the platform relies
//! on: exponential backoff on connect (1s doubling up to 30s, five
//! attempts), linear backoff on publish (500ms × attempt, three attempts),
//! and a background watcher that drives delivery callbacks and reconnects
//! when the client reports a fatal error. Publish takes the read lock;
//! reconnect takes the write lock.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{BaseProducer, BaseRecord, Producer};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, sleep};
use tracing::{debug, error, info, warn};

use booking_shared::HotelChangeEvent;

/// Maximum connect attempts per retry ladder.
const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Initial connect backoff.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Connect backoff multiplier.
const BACKOFF_FACTOR: u32 = 2;

/// Connect backoff cap.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Publish attempts before giving up.
const PUBLISH_ATTEMPTS: u32 = 3;

/// Linear publish backoff unit (multiplied by the attempt number).
const PUBLISH_BACKOFF: Duration = Duration::from_millis(500);

/// Errors from the change-event publisher.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Failed to create the producer.
    #[error("failed to create producer: {0}")]
    Creation(String),

    /// Failed to enqueue a message after retries.
    #[error("failed to publish message: {0}")]
    Send(String),

    /// Failed to serialize the event payload.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No connection and reconnecting failed.
    #[error("bus connection unavailable: {0}")]
    Disconnected(String),
}

/// Emits change events to the bus.
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    /// Publish one event. A failure here fails the calling mutation; the
    /// primary store stays authoritative and the caller retries.
    async fn publish(&self, event: &HotelChangeEvent) -> Result<(), PublishError>;
}

/// Configuration for the Kafka publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Broker address (e.g. "localhost:9092").
    pub broker: String,
    /// Topic carrying the change events.
    pub topic: String,
    /// Client id reported to the broker.
    pub client_id: String,
}

impl PublisherConfig {
    pub fn new(broker: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            topic: topic.into(),
            client_id: "inventory-api".to_string(),
        }
    }
}

struct PublisherState {
    producer: Option<BaseProducer>,
    connected: bool,
}

/// Kafka-backed [`ChangePublisher`].
pub struct KafkaChangePublisher {
    config: PublisherConfig,
    state: RwLock<PublisherState>,
}

impl KafkaChangePublisher {
    /// Create a publisher. No connection is attempted yet; call
    /// [`ensure_connected`] at startup (a failure there leaves the
    /// publisher degraded and the next publish retries).
    ///
    /// [`ensure_connected`]: KafkaChangePublisher::ensure_connected
    pub fn new(config: PublisherConfig) -> Self {
        Self {
            config,
            state: RwLock::new(PublisherState {
                producer: None,
                connected: false,
            }),
        }
    }

    fn build_producer(config: &PublisherConfig) -> Result<BaseProducer, PublishError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", &config.broker)
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| PublishError::Creation(e.to_string()))?;

        Ok(producer)
    }

    /// Whether a live producer is held.
    pub async fn is_connected(&self) -> bool {
        let state = self.state.read().await;
        state.connected && state.producer.is_some()
    }

    /// Establish a connection, replacing any existing producer.
    async fn connect(&self) -> Result<(), PublishError> {
        let producer = Self::build_producer(&self.config)?;

        let mut state = self.state.write().await;
        state.producer = Some(producer);
        state.connected = true;
        Ok(())
    }

    /// Run the connect retry ladder: 1s, 2s, 4s, ... capped at 30s, five
    /// attempts.
    async fn connect_with_retry(&self) -> Result<(), PublishError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut last_error = String::new();

        for attempt in 1..=MAX_CONNECT_ATTEMPTS {
            info!(
                attempt = attempt,
                max_attempts = MAX_CONNECT_ATTEMPTS,
                broker = %self.config.broker,
                "Bus connection attempt"
            );

            match self.connect().await {
                Ok(()) => {
                    info!(attempt = attempt, "Connected to bus");
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt = attempt, error = %e, "Connection attempt failed");
                    last_error = e.to_string();

                    if attempt < MAX_CONNECT_ATTEMPTS {
                        sleep(backoff).await;
                        backoff = (backoff * BACKOFF_FACTOR).min(MAX_BACKOFF);
                    }
                }
            }
        }

        Err(PublishError::Disconnected(format!(
            "failed to connect after {} attempts: {}",
            MAX_CONNECT_ATTEMPTS, last_error
        )))
    }

    /// Ensure a live connection, reconnecting with backoff if needed.
    pub async fn ensure_connected(&self) -> Result<(), PublishError> {
        if self.is_connected().await {
            return Ok(());
        }

        warn!("Bus not connected, attempting to reconnect");
        self.connect_with_retry().await
    }

    async fn mark_disconnected(&self) {
        let mut state = self.state.write().await;
        state.connected = false;
    }

    /// Background watcher: drives delivery callbacks, flushes the queue, and
    /// reconnects when the client reports a fatal error. Exits on shutdown.
    pub fn spawn_watcher(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let publisher = self;
        tokio::spawn(async move {
            let mut tick = interval(Duration::from_millis(500));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!("Publisher watcher received shutdown signal");
                        publisher.close().await;
                        break;
                    }
                    _ = tick.tick() => {
                        let fatal = {
                            let state = publisher.state.read().await;
                            match state.producer.as_ref() {
                                Some(producer) => {
                                    producer.poll(Duration::ZERO);
                                    producer.client().fatal_error().is_some()
                                }
                                None => false,
                            }
                        };

                        if fatal {
                            error!("Bus client reported a fatal error, reconnecting");
                            publisher.mark_disconnected().await;
                            if let Err(e) = publisher.connect_with_retry().await {
                                error!(error = %e, "Failed to reconnect to bus");
                            }
                        }
                    }
                }
            }
        });
    }

    /// Flush and drop the producer. Safe to call repeatedly.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        if let Some(producer) = state.producer.take() {
            if let Err(e) = producer.flush(Duration::from_secs(5)) {
                warn!(error = %e, "Error flushing producer on close");
            }
        }
        state.connected = false;
        info!("Bus connection closed");
    }
}

#[async_trait]
impl ChangePublisher for KafkaChangePublisher {
    async fn publish(&self, event: &HotelChangeEvent) -> Result<(), PublishError> {
        self.ensure_connected().await?;

        let payload = serde_json::to_vec(event)?;
        let key = event.hotel_id.to_string();
        let mut last_error = String::new();

        for attempt in 1..=PUBLISH_ATTEMPTS {
            {
                let state = self.state.read().await;
                if let Some(producer) = state.producer.as_ref() {
                    let record = BaseRecord::to(&self.config.topic)
                        .key(key.as_bytes())
                        .payload(&payload);

                    match producer.send(record) {
                        Ok(()) => {
                            producer.poll(Duration::ZERO);
                            debug!(
                                topic = %self.config.topic,
                                hotel_id = %event.hotel_id,
                                operation = ?event.operation,
                                "Change event published"
                            );
                            return Ok(());
                        }
                        Err((e, _)) => {
                            last_error = e.to_string();
                            warn!(attempt = attempt, error = %last_error, "Publish attempt failed");
                        }
                    }
                } else {
                    last_error = "no producer".to_string();
                }
            }

            self.mark_disconnected().await;

            if attempt < PUBLISH_ATTEMPTS {
                sleep(PUBLISH_BACKOFF * attempt).await;
                if let Err(e) = self.ensure_connected().await {
                    last_error = e.to_string();
                }
            }
        }

        Err(PublishError::Send(format!(
            "after {} attempts: {}",
            PUBLISH_ATTEMPTS, last_error
        )))
    }
}
