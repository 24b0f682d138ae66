//! Orchestrator module for the search indexer ingest.
//!
//! Coordinates the consumer, processor, and loader components and owns the
//! shutdown signal for the background tasks.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{KafkaChangeConsumer, StreamMessage};
use crate::errors::IngestError;
use crate::loader::SearchLoader;
use crate::processor::HotelProcessor;

/// Source of change-event batches.
///
/// [`KafkaChangeConsumer`] is the production implementation; tests drive the
/// orchestrator with scripted consumers.
///
/// [`KafkaChangeConsumer`]: crate::consumer::KafkaChangeConsumer
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Register against the queue.
    fn subscribe(&self) -> Result<(), IngestError>;

    /// Pump messages into `sender` until shutdown, committing offsets as
    /// acknowledgments arrive on `ack_receiver`.
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        ack_receiver: mpsc::Receiver<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError>;
}

#[async_trait]
impl Consumer for KafkaChangeConsumer {
    fn subscribe(&self) -> Result<(), IngestError> {
        KafkaChangeConsumer::subscribe(self)
    }

    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        ack_receiver: mpsc::Receiver<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        KafkaChangeConsumer::run(self, sender, ack_receiver, shutdown).await
    }
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the message channel buffers.
    pub channel_buffer_size: usize,
    /// Interval between progress log lines, in seconds.
    pub progress_interval_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
            progress_interval_secs: 30,
        }
    }
}

/// Orchestrator that coordinates the ingest components.
///
/// Runs the consumer on a dedicated worker task, routes batches through the
/// processor and loader, and acknowledges each batch back to the consumer so
/// offsets are only committed for work the index absorbed.
pub struct Orchestrator {
    consumer: Arc<dyn Consumer>,
    processor: HotelProcessor,
    loader: SearchLoader,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    /// Total change events processed since startup.
    total_events_processed: Arc<AtomicU64>,
    /// Total index operations applied since startup.
    total_operations_applied: Arc<AtomicU64>,
}

impl Orchestrator {
    /// Create a new orchestrator with default configuration.
    pub fn new(consumer: Arc<dyn Consumer>, processor: HotelProcessor, loader: SearchLoader) -> Self {
        Self::with_config(consumer, processor, loader, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        consumer: Arc<dyn Consumer>,
        processor: HotelProcessor,
        loader: SearchLoader,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            consumer,
            processor,
            loader,
            config,
            shutdown_tx,
            total_events_processed: Arc::new(AtomicU64::new(0)),
            total_operations_applied: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run the orchestrator.
    ///
    /// Blocks until the consumer stream ends, a shutdown signal arrives, or
    /// an unrecoverable error occurs.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<(), IngestError> {
        info!("Starting search indexer orchestrator");

        self.loader.check_ready().await?;
        self.consumer.subscribe()?;

        let (event_transmitter, mut event_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);
        let (ack_transmitter, ack_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);

        let consumer = Arc::clone(&self.consumer);
        let shutdown_rx = self.shutdown_tx.subscribe();

        let consumer_handle = tokio::spawn(async move {
            if let Err(e) = consumer.run(event_transmitter, ack_receiver, shutdown_rx).await {
                error!(error = %e, "Consumer error");
            }
        });

        info!("Ready to process change events");

        let total_events = Arc::clone(&self.total_events_processed);
        let total_operations = Arc::clone(&self.total_operations_applied);
        let mut progress_timer = interval(Duration::from_secs(self.config.progress_interval_secs));
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                msg = event_receiver.recv() => {
                    match msg {
                        Some(StreamMessage::Events { events, offsets }) => {
                            debug!(
                                event_count = events.len(),
                                offset_count = offsets.len(),
                                "Received events from consumer"
                            );
                            match self.process_events(events).await {
                                Ok(()) => {
                                    let _ = ack_transmitter.send(StreamMessage::Acknowledgment {
                                        offsets,
                                        success: true,
                                        error: None,
                                    }).await;
                                }
                                Err(e) => {
                                    error!(error = %e, "Failed to process events, batch will be redelivered");
                                    let _ = ack_transmitter.send(StreamMessage::Acknowledgment {
                                        offsets,
                                        success: false,
                                        error: Some(e.to_string()),
                                    }).await;
                                }
                            }
                        }
                        Some(StreamMessage::Error(e)) => {
                            error!(error = %e, "Received error from consumer");
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Consumer stream ended");
                            break;
                        }
                        Some(StreamMessage::Acknowledgment { .. }) => {
                            warn!("Received acknowledgment on event channel");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    let _ = self.shutdown_tx.send(());
                    break;
                }
                _ = progress_timer.tick() => {
                    info!(
                        events_processed = total_events.load(Ordering::Relaxed),
                        operations_applied = total_operations.load(Ordering::Relaxed),
                        "Ingest progress"
                    );
                }
            }
        }

        let _ = consumer_handle.await;

        info!(
            total_events_processed = self.total_events_processed.load(Ordering::Relaxed),
            total_operations_applied = self.total_operations_applied.load(Ordering::Relaxed),
            "Orchestrator shutdown complete"
        );
        Ok(())
    }

    /// Run one batch through processor and loader.
    ///
    /// Returns `Ok` only after the index absorbed every operation, so the
    /// caller can safely acknowledge the batch.
    async fn process_events(
        &mut self,
        events: Vec<booking_shared::HotelChangeEvent>,
    ) -> Result<(), IngestError> {
        self.total_events_processed
            .fetch_add(events.len() as u64, Ordering::Relaxed);

        let processed = self.processor.process_batch(events).await?;
        if processed.is_empty() {
            debug!("No index operations after processing");
            return Ok(());
        }

        self.total_operations_applied
            .fetch_add(processed.len() as u64, Ordering::Relaxed);

        self.loader.load(processed).await
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
