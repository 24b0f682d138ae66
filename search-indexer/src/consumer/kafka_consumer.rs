//! Kafka consumer implementation for hotel change events.
//!
//! Registers a durable consumer against the change-event topic and forwards
//! parsed events to the orchestrator. Auto-commit is disabled: offsets are
//! committed only after the orchestrator acknowledges a batch, so a crash
//! mid-processing redelivers rather than loses events.

use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    message::Message as KafkaMessage,
    TopicPartitionList,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use booking_shared::HotelChangeEvent;

use crate::consumer::messages::{MessageOffset, StreamMessage};
use crate::errors::IngestError;

/// Default batch size before a flush to the orchestrator.
const DEFAULT_BATCH_SIZE: usize = 50;

/// Default batch timeout in milliseconds.
const DEFAULT_BATCH_TIMEOUT_MS: u64 = 1000;

/// Kafka consumer for hotel change events.
pub struct KafkaChangeConsumer {
    consumer: StreamConsumer,
    topic: String,
    batch_size: usize,
    batch_timeout: Duration,
}

impl KafkaChangeConsumer {
    /// Create a new consumer with default batching.
    ///
    /// # Arguments
    ///
    /// * `brokers` - Kafka broker addresses (comma-separated)
    /// * `group_id` - Consumer group ID
    /// * `topic` - The change-event topic to consume
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self, IngestError> {
        Self::with_batch_config(
            brokers,
            group_id,
            topic,
            DEFAULT_BATCH_SIZE,
            DEFAULT_BATCH_TIMEOUT_MS,
        )
    }

    /// Create a new consumer with custom batch configuration.
    pub fn with_batch_config(
        brokers: &str,
        group_id: &str,
        topic: &str,
        batch_size: usize,
        batch_timeout_ms: u64,
    ) -> Result<Self, IngestError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| IngestError::kafka(e.to_string()))?;

        info!(
            brokers = %brokers,
            group_id = %group_id,
            topic = %topic,
            batch_size = batch_size,
            batch_timeout_ms = batch_timeout_ms,
            "Created Kafka change-event consumer"
        );

        Ok(Self {
            consumer,
            topic: topic.to_string(),
            batch_size,
            batch_timeout: Duration::from_millis(batch_timeout_ms),
        })
    }

    /// Subscribe to the configured topic.
    pub fn subscribe(&self) -> Result<(), IngestError> {
        self.consumer
            .subscribe(&[self.topic.as_str()])
            .map_err(|e| IngestError::kafka(e.to_string()))?;

        info!(topic = %self.topic, "Subscribed to change-event topic");
        Ok(())
    }

    /// Start consuming messages and send them through the channel.
    ///
    /// Events are batched before being sent. Offsets are committed when the
    /// matching acknowledgment arrives on `ack_receiver`.
    #[instrument(skip(self, sender, ack_receiver, shutdown))]
    pub async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        mut ack_receiver: mpsc::Receiver<StreamMessage>,
        mut shutdown: tokio::sync::broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        use futures::StreamExt;

        let mut message_stream = self.consumer.stream();
        let mut batch: Vec<HotelChangeEvent> = Vec::with_capacity(self.batch_size);
        let mut pending_offsets: Vec<MessageOffset> = Vec::new();
        let mut flush_timer = tokio::time::interval(self.batch_timeout);
        flush_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it.
        flush_timer.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Consumer received shutdown signal");
                    // Uncommitted batches are re-read from the last committed
                    // offset on restart.
                    let _ = sender.send(StreamMessage::End).await;
                    break;
                }
                ack_msg = ack_receiver.recv() => {
                    match ack_msg {
                        Some(StreamMessage::Acknowledgment { offsets, success, error }) => {
                            if success {
                                if let Err(e) = self.commit_offsets(&offsets) {
                                    error!(error = %e, "Failed to commit offsets after acknowledgment");
                                } else {
                                    debug!(offset_count = offsets.len(), "Committed offsets after successful processing");
                                }
                            } else {
                                error!(
                                    offset_count = offsets.len(),
                                    error = error.as_deref().unwrap_or("Unknown error"),
                                    "Not committing offsets due to processing failure"
                                );
                            }
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Acknowledgment channel closed");
                            break;
                        }
                        _ => {}
                    }
                }
                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            debug!(
                                topic = %msg.topic(),
                                partition = msg.partition(),
                                offset = msg.offset(),
                                "Received message from queue"
                            );
                            match self.parse_message(msg.payload()) {
                                Ok(Some(event)) => {
                                    batch.push(event);
                                    pending_offsets.push((msg.topic().to_string(), msg.partition(), msg.offset()));

                                    if batch.len() >= self.batch_size {
                                        self.flush_batch(&mut batch, &mut pending_offsets, &sender).await?;
                                    }
                                }
                                Ok(None) => {
                                    // Nothing to process; commit immediately so
                                    // the message is not re-read on restart.
                                    self.commit_offsets(&[(msg.topic().to_string(), msg.partition(), msg.offset())])?;
                                }
                                Err(e) => {
                                    error!(
                                        topic = %msg.topic(),
                                        partition = msg.partition(),
                                        offset = msg.offset(),
                                        error = %e,
                                        "Failed to parse message, dropping"
                                    );
                                    // A payload that never parses would wedge the
                                    // partition if left uncommitted.
                                    self.commit_offsets(&[(msg.topic().to_string(), msg.partition(), msg.offset())])?;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka error");
                            let _ = sender.send(StreamMessage::Error(e.to_string())).await;
                        }
                        None => {
                            info!("Message stream ended");
                            if !batch.is_empty() {
                                self.flush_batch(&mut batch, &mut pending_offsets, &sender).await?;
                            }
                            let _ = sender.send(StreamMessage::End).await;
                            break;
                        }
                    }
                }
                _ = flush_timer.tick() => {
                    if !batch.is_empty() {
                        debug!(count = batch.len(), "Flushing batch due to timeout");
                        self.flush_batch(&mut batch, &mut pending_offsets, &sender).await?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Send the accumulated batch to the orchestrator and clear it.
    async fn flush_batch(
        &self,
        batch: &mut Vec<HotelChangeEvent>,
        pending_offsets: &mut Vec<MessageOffset>,
        sender: &mpsc::Sender<StreamMessage>,
    ) -> Result<(), IngestError> {
        if batch.is_empty() {
            return Ok(());
        }

        let events = std::mem::take(batch);
        let offsets = std::mem::take(pending_offsets);

        info!(
            event_count = events.len(),
            offset_count = offsets.len(),
            "Sending batch of change events to processor"
        );
        sender
            .send(StreamMessage::Events { events, offsets })
            .await
            .map_err(|e| IngestError::ChannelError(e.to_string()))?;

        Ok(())
    }

    /// Commit offsets for processed messages.
    fn commit_offsets(&self, offsets: &[MessageOffset]) -> Result<(), IngestError> {
        if offsets.is_empty() {
            return Ok(());
        }

        let mut tpl = TopicPartitionList::new();
        for (topic, partition, offset) in offsets {
            tpl.add_partition_offset(topic, *partition, rdkafka::Offset::Offset(offset + 1))
                .map_err(|e| IngestError::kafka(e.to_string()))?;
        }

        self.consumer
            .commit(&tpl, rdkafka::consumer::CommitMode::Async)
            .map_err(|e| IngestError::kafka(e.to_string()))?;

        Ok(())
    }

    /// Parse a message payload into a change event.
    ///
    /// Empty payloads yield `None`. Malformed JSON is an error; the caller
    /// logs and drops it.
    fn parse_message(&self, payload: Option<&[u8]>) -> Result<Option<HotelChangeEvent>, IngestError> {
        let payload = match payload {
            Some(p) if !p.is_empty() => p,
            _ => {
                warn!("Received message with empty payload");
                return Ok(None);
            }
        };

        let event: HotelChangeEvent = serde_json::from_slice(payload)
            .map_err(|e| IngestError::parse(format!("Failed to decode change event: {}", e)))?;

        Ok(Some(event))
    }
}
