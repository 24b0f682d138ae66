//! Primary-store abstraction for hotels and reservations.

mod postgres;

pub use postgres::PostgresInventoryStore;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use booking_shared::{Hotel, Reservation};
use chrono::NaiveTime;

use crate::availability::StayRange;

/// Errors from the primary store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether this error is a missing row rather than a store failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Partial update of a hotel: only provided fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HotelUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub price_per_night: Option<f64>,
    pub rating: Option<f64>,
    #[serde(rename = "avaiable_rooms")]
    pub available_rooms: Option<u32>,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub amenities: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl HotelUpdate {
    /// True when no field is set; an update with nothing to do.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.country.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.price_per_night.is_none()
            && self.rating.is_none()
            && self.available_rooms.is_none()
            && self.check_in_time.is_none()
            && self.check_out_time.is_none()
            && self.amenities.is_none()
            && self.images.is_none()
    }

    /// Merge this update into a hotel record.
    pub fn apply_to(&self, hotel: &mut Hotel) {
        if let Some(ref v) = self.name {
            hotel.name = v.clone();
        }
        if let Some(ref v) = self.description {
            hotel.description = v.clone();
        }
        if let Some(ref v) = self.address {
            hotel.address = v.clone();
        }
        if let Some(ref v) = self.city {
            hotel.city = v.clone();
        }
        if let Some(ref v) = self.state {
            hotel.state = v.clone();
        }
        if let Some(ref v) = self.country {
            hotel.country = v.clone();
        }
        if let Some(ref v) = self.phone {
            hotel.phone = v.clone();
        }
        if let Some(ref v) = self.email {
            hotel.email = v.clone();
        }
        if let Some(v) = self.price_per_night {
            hotel.price_per_night = v;
        }
        if let Some(v) = self.rating {
            hotel.rating = v;
        }
        if let Some(v) = self.available_rooms {
            hotel.available_rooms = v;
        }
        if let Some(v) = self.check_in_time {
            hotel.check_in_time = v;
        }
        if let Some(v) = self.check_out_time {
            hotel.check_out_time = v;
        }
        if let Some(ref v) = self.amenities {
            hotel.amenities = v.clone();
        }
        if let Some(ref v) = self.images {
            hotel.images = v.clone();
        }
    }
}

/// Authoritative persistence for hotels and reservations.
///
/// No other service mutates this store; the cache and the search index are
/// derived projections.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn hotel_by_id(&self, id: &Uuid) -> Result<Hotel, StorageError>;

    async fn create_hotel(&self, hotel: &Hotel) -> Result<(), StorageError>;

    /// Apply a partial update. `NotFound` when the hotel does not exist.
    async fn update_hotel(&self, id: &Uuid, update: &HotelUpdate) -> Result<(), StorageError>;

    async fn delete_hotel(&self, id: &Uuid) -> Result<(), StorageError>;

    async fn create_reservation(&self, reservation: &Reservation) -> Result<(), StorageError>;

    async fn reservation_by_id(&self, id: &Uuid) -> Result<Reservation, StorageError>;

    async fn cancel_reservation(&self, id: &Uuid) -> Result<(), StorageError>;

    async fn reservations_by_hotel(&self, hotel_id: &Uuid) -> Result<Vec<Reservation>, StorageError>;

    async fn reservations_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, StorageError>;

    async fn reservations_by_user_and_hotel(
        &self,
        hotel_id: &Uuid,
        user_id: &str,
    ) -> Result<Vec<Reservation>, StorageError>;

    /// Remove every reservation of a hotel (the delete cascade).
    async fn delete_reservations_by_hotel(&self, hotel_id: &Uuid) -> Result<(), StorageError>;

    /// Whether the hotel can absorb one more stay over the given range.
    /// `NotFound` when the hotel does not exist.
    async fn is_hotel_available(
        &self,
        hotel_id: &Uuid,
        stay: &StayRange,
    ) -> Result<bool, StorageError>;
}
