//! Document types stored in the search index.

use booking_shared::Hotel;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A hotel as it is stored in the search index.
///
/// This is a flat projection of the hotel wire type plus an `indexed_at`
/// timestamp. The document id in the index is the hotel id, which makes
/// index, update and delete idempotent per hotel. Field names match the
/// HTTP wire shape, including the historical `avaiable_rooms` spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelDocument {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub price_per_night: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(rename = "avaiable_rooms", default)]
    pub available_rooms: u32,
    #[serde(default)]
    pub check_in_time: NaiveTime,
    #[serde(default)]
    pub check_out_time: NaiveTime,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub indexed_at: DateTime<Utc>,
}

impl HotelDocument {
    /// Document id used in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }

    /// Strip the index-only metadata back down to the hotel wire type.
    pub fn into_hotel(self) -> Hotel {
        Hotel {
            id: self.id,
            name: self.name,
            description: self.description,
            address: self.address,
            city: self.city,
            state: self.state,
            country: self.country,
            phone: self.phone,
            email: self.email,
            price_per_night: self.price_per_night,
            rating: self.rating,
            available_rooms: self.available_rooms,
            check_in_time: self.check_in_time,
            check_out_time: self.check_out_time,
            amenities: self.amenities,
            images: self.images,
        }
    }
}

impl From<Hotel> for HotelDocument {
    fn from(hotel: Hotel) -> Self {
        Self {
            id: hotel.id,
            name: hotel.name,
            description: hotel.description,
            address: hotel.address,
            city: hotel.city,
            state: hotel.state,
            country: hotel.country,
            phone: hotel.phone,
            email: hotel.email,
            price_per_night: hotel.price_per_night,
            rating: hotel.rating,
            available_rooms: hotel.available_rooms,
            check_in_time: hotel.check_in_time,
            check_out_time: hotel.check_out_time,
            amenities: hotel.amenities,
            images: hotel.images,
            indexed_at: Utc::now(),
        }
    }
}
