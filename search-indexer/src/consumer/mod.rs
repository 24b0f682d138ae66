//! Queue consumer for hotel change events.

mod kafka_consumer;
mod messages;

pub use kafka_consumer::KafkaChangeConsumer;
pub use messages::StreamMessage;
