//! Shared test doubles for the inventory service: an in-memory store, a
//! recording publisher, and request builders.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use booking_shared::{Hotel, HotelChangeEvent, Reservation};
use inventory_api::availability::{fits_capacity, StayRange};
use inventory_api::cache::{CacheConfig, InventoryCache};
use inventory_api::events::{ChangePublisher, PublishError};
use inventory_api::service::{HotelsService, NewHotel, NewReservation};
use inventory_api::storage::{HotelUpdate, InventoryStore, StorageError};

/// In-memory [`InventoryStore`] with the same semantics as the PostgreSQL
/// implementation.
#[derive(Default)]
pub struct InMemoryStore {
    pub hotels: Mutex<HashMap<Uuid, Hotel>>,
    pub reservations: Mutex<HashMap<Uuid, Reservation>>,
    pub fail: AtomicBool,
}

impl InMemoryStore {
    fn check_failure(&self) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StorageError::Database(sqlx::Error::PoolClosed))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn hotel_by_id(&self, id: &Uuid) -> Result<Hotel, StorageError> {
        self.check_failure()?;
        self.hotels
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("hotel {}", id)))
    }

    async fn create_hotel(&self, hotel: &Hotel) -> Result<(), StorageError> {
        self.check_failure()?;
        self.hotels.lock().unwrap().insert(hotel.id, hotel.clone());
        Ok(())
    }

    async fn update_hotel(&self, id: &Uuid, update: &HotelUpdate) -> Result<(), StorageError> {
        self.check_failure()?;
        let mut hotels = self.hotels.lock().unwrap();
        let hotel = hotels
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found(format!("hotel {}", id)))?;
        update.apply_to(hotel);
        Ok(())
    }

    async fn delete_hotel(&self, id: &Uuid) -> Result<(), StorageError> {
        self.check_failure()?;
        self.hotels
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(format!("hotel {}", id)))
    }

    async fn create_reservation(&self, reservation: &Reservation) -> Result<(), StorageError> {
        self.check_failure()?;
        self.reservations
            .lock()
            .unwrap()
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn reservation_by_id(&self, id: &Uuid) -> Result<Reservation, StorageError> {
        self.check_failure()?;
        self.reservations
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("reservation {}", id)))
    }

    async fn cancel_reservation(&self, id: &Uuid) -> Result<(), StorageError> {
        self.check_failure()?;
        self.reservations
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(format!("reservation {}", id)))
    }

    async fn reservations_by_hotel(&self, hotel_id: &Uuid) -> Result<Vec<Reservation>, StorageError> {
        self.check_failure()?;
        Ok(self
            .reservations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.hotel_id == *hotel_id)
            .cloned()
            .collect())
    }

    async fn reservations_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, StorageError> {
        self.check_failure()?;
        Ok(self
            .reservations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn reservations_by_user_and_hotel(
        &self,
        hotel_id: &Uuid,
        user_id: &str,
    ) -> Result<Vec<Reservation>, StorageError> {
        self.check_failure()?;
        Ok(self
            .reservations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.hotel_id == *hotel_id && r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_reservations_by_hotel(&self, hotel_id: &Uuid) -> Result<(), StorageError> {
        self.check_failure()?;
        self.reservations
            .lock()
            .unwrap()
            .retain(|_, r| r.hotel_id != *hotel_id);
        Ok(())
    }

    async fn is_hotel_available(
        &self,
        hotel_id: &Uuid,
        stay: &StayRange,
    ) -> Result<bool, StorageError> {
        self.check_failure()?;
        let capacity = self
            .hotels
            .lock()
            .unwrap()
            .get(hotel_id)
            .map(|h| h.available_rooms)
            .ok_or_else(|| StorageError::not_found(format!("hotel {}", hotel_id)))?;

        let reservations: Vec<Reservation> = self
            .reservations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.hotel_id == *hotel_id)
            .cloned()
            .collect();

        Ok(fits_capacity(capacity, &reservations, stay))
    }
}

/// Publisher that records every event; optionally fails.
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<HotelChangeEvent>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ChangePublisher for RecordingPublisher {
    async fn publish(&self, event: &HotelChangeEvent) -> Result<(), PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Send("recording publisher failure".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Fully wired service over in-memory collaborators.
pub struct Harness {
    pub service: Arc<HotelsService>,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<InventoryCache>,
    pub publisher: Arc<RecordingPublisher>,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::default());
    let cache = Arc::new(InventoryCache::new(CacheConfig::default()));
    let publisher = Arc::new(RecordingPublisher::default());
    let service = Arc::new(HotelsService::new(
        Arc::clone(&store) as Arc<dyn InventoryStore>,
        Arc::clone(&cache),
        Arc::clone(&publisher) as Arc<dyn ChangePublisher>,
    ));
    Harness {
        service,
        store,
        cache,
        publisher,
    }
}

pub fn new_hotel(name: &str, rooms: u32) -> NewHotel {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "description": format!("{} description", name),
        "city": "Mar del Plata",
        "price_per_night": 120.0,
        "avaiable_rooms": rooms,
    }))
    .unwrap()
}

pub fn new_reservation(hotel_id: Uuid, user_id: &str, check_in: &str, check_out: &str) -> NewReservation {
    serde_json::from_value(serde_json::json!({
        "hotel_id": hotel_id,
        "user_id": user_id,
        "check_in": check_in,
        "check_out": check_out,
    }))
    .unwrap()
}
