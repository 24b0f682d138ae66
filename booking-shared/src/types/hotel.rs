//! Hotel wire type.
//!
//! This is the JSON shape served by the inventory service and re-fetched by
//! the search indexer; both sides must agree on it exactly.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A hotel as it travels over HTTP between services.
///
/// `available_rooms` is the only field that participates in availability
/// arithmetic: it is the number of rooms that may be occupied on any single
/// night. The historical wire name `avaiable_rooms` (sic) is part of the
/// contract and must not be corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
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
    /// Room capacity. Kept under its historical wire name for compatibility.
    #[serde(rename = "avaiable_rooms", default)]
    pub available_rooms: u32,
    #[serde(default = "default_check_in_time")]
    pub check_in_time: NaiveTime,
    #[serde(default = "default_check_out_time")]
    pub check_out_time: NaiveTime,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_check_in_time() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default()
}

fn default_check_out_time() -> NaiveTime {
    NaiveTime::from_hms_opt(11, 0, 0).unwrap_or_default()
}

impl Hotel {
    /// Create a hotel with the given identity and sensible zero defaults for
    /// everything else. Mostly useful in tests and partial-update merges.
    pub fn named(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            country: String::new(),
            phone: String::new(),
            email: String::new(),
            price_per_night: 0.0,
            rating: 0.0,
            available_rooms: 0,
            check_in_time: default_check_in_time(),
            check_out_time: default_check_out_time(),
            amenities: Vec::new(),
            images: Vec::new(),
        }
    }
}
