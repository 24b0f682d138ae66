//! Change-event payload for the message bus.
//!
//! The payload deliberately carries only the operation and the hotel id;
//! consumers resolve the hotel body by calling the inventory service, which
//! keeps stale or out-of-order payloads off the bus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mutation kind carried by a change event.
///
/// `Unknown` absorbs operation strings this build does not recognize so a
/// consumer can log and drop them instead of failing the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

/// A mutation to hotel state, published by the inventory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelChangeEvent {
    pub operation: ChangeOperation,
    pub hotel_id: Uuid,
}

impl HotelChangeEvent {
    pub fn create(hotel_id: Uuid) -> Self {
        Self {
            operation: ChangeOperation::Create,
            hotel_id,
        }
    }

    pub fn update(hotel_id: Uuid) -> Self {
        Self {
            operation: ChangeOperation::Update,
            hotel_id,
        }
    }

    pub fn delete(hotel_id: Uuid) -> Self {
        Self {
            operation: ChangeOperation::Delete,
            hotel_id,
        }
    }
}
