//! Processor module: resolves change events into index operations.

mod hotel_processor;

pub use hotel_processor::{HotelProcessor, ProcessedEvent};
