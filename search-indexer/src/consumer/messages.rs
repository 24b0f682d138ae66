//! Message types flowing between the consumer and the orchestrator.

use booking_shared::HotelChangeEvent;

/// A (topic, partition, offset) triple identifying a consumed message.
pub type MessageOffset = (String, i32, i64);

/// Messages exchanged over the ingest channels.
///
/// Events travel consumer → orchestrator; acknowledgments travel back so the
/// consumer only commits offsets for batches the index actually absorbed.
#[derive(Debug)]
pub enum StreamMessage {
    /// A batch of change events with the offsets to commit on success.
    Events {
        events: Vec<HotelChangeEvent>,
        offsets: Vec<MessageOffset>,
    },
    /// Outcome of processing a batch.
    Acknowledgment {
        offsets: Vec<MessageOffset>,
        success: bool,
        error: Option<String>,
    },
    /// The stream has ended.
    End,
    /// An error occurred on the stream.
    Error(String),
}
