//! Orchestration of the primary store, the cache and the event publisher.
//!
//! Every mutation follows the same order: primary store first, then the
//! in-process cache (best-effort), then the change event on the bus. A
//! publish failure fails the whole operation so the caller retries against
//! an authoritative store; a cache failure never does.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use booking_shared::{Hotel, HotelChangeEvent, Reservation};
use chrono::NaiveTime;

use crate::availability::StayRange;
use crate::cache::InventoryCache;
use crate::errors::ServiceError;
use crate::events::ChangePublisher;
use crate::storage::{HotelUpdate, InventoryStore, StorageError};

/// Request body for creating a hotel.
#[derive(Debug, Clone, Deserialize)]
pub struct NewHotel {
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
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Request body for creating a reservation. Dates arrive as wire strings so
/// a malformed date is a 400, not a body-decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReservation {
    pub hotel_id: Uuid,
    #[serde(default)]
    pub hotel_name: String,
    pub user_id: String,
    pub check_in: String,
    pub check_out: String,
}

/// The inventory service: authoritative hotels and reservations.
pub struct HotelsService {
    store: Arc<dyn InventoryStore>,
    cache: Arc<InventoryCache>,
    publisher: Arc<dyn ChangePublisher>,
}

impl HotelsService {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        cache: Arc<InventoryCache>,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        Self {
            store,
            cache,
            publisher,
        }
    }

    // --- hotels ---

    /// Read a hotel: cache first, then the store with a best-effort
    /// back-fill.
    pub async fn hotel_by_id(&self, id: &Uuid) -> Result<Hotel, ServiceError> {
        if let Some(hotel) = self.cache.hotel_by_id(id).await {
            return Ok(hotel);
        }

        let hotel = self
            .store
            .hotel_by_id(id)
            .await
            .map_err(not_found_or_storage(format!("hotel {}", id)))?;

        self.cache.put_hotel(&hotel).await;
        Ok(hotel)
    }

    /// Create a hotel: store, cache, then the CREATE event.
    pub async fn create_hotel(&self, request: NewHotel) -> Result<Uuid, ServiceError> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::validation("name is required"));
        }
        if request.price_per_night < 0.0 {
            return Err(ServiceError::validation("price_per_night must be non-negative"));
        }

        let hotel = Hotel {
            id: Uuid::new_v4(),
            name: request.name,
            description: request.description,
            address: request.address,
            city: request.city,
            state: request.state,
            country: request.country,
            phone: request.phone,
            email: request.email,
            price_per_night: request.price_per_night,
            rating: request.rating,
            available_rooms: request.available_rooms,
            check_in_time: request
                .check_in_time
                .unwrap_or_else(|| NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default()),
            check_out_time: request
                .check_out_time
                .unwrap_or_else(|| NaiveTime::from_hms_opt(11, 0, 0).unwrap_or_default()),
            amenities: request.amenities,
            images: request.images,
        };

        self.store.create_hotel(&hotel).await?;
        self.cache.put_hotel(&hotel).await;
        self.publisher
            .publish(&HotelChangeEvent::create(hotel.id))
            .await?;

        info!(hotel_id = %hotel.id, "Hotel created");
        Ok(hotel.id)
    }

    /// Partially update a hotel: store, cache merge, then the UPDATE event.
    pub async fn update_hotel(&self, id: &Uuid, update: HotelUpdate) -> Result<(), ServiceError> {
        self.store
            .update_hotel(id, &update)
            .await
            .map_err(not_found_or_storage(format!("hotel {}", id)))?;

        if !self.cache.apply_hotel_update(id, &update).await {
            debug!(hotel_id = %id, "Hotel not cached, skipping cache merge");
        }

        self.publisher.publish(&HotelChangeEvent::update(*id)).await?;

        info!(hotel_id = %id, "Hotel updated");
        Ok(())
    }

    /// Delete a hotel and cascade to its reservations, then emit DELETE.
    ///
    /// Order: reservations leave the store and the cache before the hotel
    /// row goes, so no moment exists where a cache entry points at a
    /// reservation whose hotel is already gone.
    pub async fn delete_hotel(&self, id: &Uuid) -> Result<(), ServiceError> {
        // Surface a missing hotel before touching any reservation.
        self.store
            .hotel_by_id(id)
            .await
            .map_err(not_found_or_storage(format!("hotel {}", id)))?;

        self.store.delete_reservations_by_hotel(id).await?;
        self.cache.remove_hotel_reservations(id).await;

        self.store
            .delete_hotel(id)
            .await
            .map_err(not_found_or_storage(format!("hotel {}", id)))?;
        self.cache.remove_hotel(id).await;

        self.publisher.publish(&HotelChangeEvent::delete(*id)).await?;

        info!(hotel_id = %id, "Hotel deleted with reservation cascade");
        Ok(())
    }

    // --- reservations ---

    /// Create a reservation after checking capacity against the primary
    /// store. The denormalized hotel name is filled from the hotel record
    /// when the request leaves it empty.
    pub async fn create_reservation(
        &self,
        request: NewReservation,
    ) -> Result<Reservation, ServiceError> {
        let stay = StayRange::parse(&request.check_in, &request.check_out)?;

        if request.user_id.trim().is_empty() {
            return Err(ServiceError::validation("user_id is required"));
        }

        let hotel = self
            .store
            .hotel_by_id(&request.hotel_id)
            .await
            .map_err(not_found_or_storage(format!("hotel {}", request.hotel_id)))?;

        let available = self
            .store
            .is_hotel_available(&request.hotel_id, &stay)
            .await?;
        if !available {
            return Err(ServiceError::unavailable(format!(
                "hotel {} has no room between {} and {}",
                request.hotel_id, request.check_in, request.check_out
            )));
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            hotel_id: request.hotel_id,
            hotel_name: if request.hotel_name.trim().is_empty() {
                hotel.name
            } else {
                request.hotel_name
            },
            user_id: request.user_id,
            check_in: stay.check_in,
            check_out: stay.check_out,
        };

        self.store.create_reservation(&reservation).await?;
        self.cache.put_reservation(&reservation).await;

        info!(
            reservation_id = %reservation.id,
            hotel_id = %reservation.hotel_id,
            "Reservation created"
        );
        Ok(reservation)
    }

    /// Read a reservation: cache first, store second, back-filling on miss.
    pub async fn reservation_by_id(&self, id: &Uuid) -> Result<Reservation, ServiceError> {
        if let Some(reservation) = self.cache.reservation_by_id(id).await {
            return Ok(reservation);
        }

        let reservation = self
            .store
            .reservation_by_id(id)
            .await
            .map_err(not_found_or_storage(format!("reservation {}", id)))?;

        self.cache.put_reservation(&reservation).await;
        Ok(reservation)
    }

    /// Cancel a reservation in the store, then in the cache.
    pub async fn cancel_reservation(&self, id: &Uuid) -> Result<(), ServiceError> {
        self.store
            .cancel_reservation(id)
            .await
            .map_err(not_found_or_storage(format!("reservation {}", id)))?;

        self.cache.remove_reservation(id).await;

        info!(reservation_id = %id, "Reservation cancelled");
        Ok(())
    }

    pub async fn reservations_by_hotel(
        &self,
        hotel_id: &Uuid,
    ) -> Result<Vec<Reservation>, ServiceError> {
        if let Some(reservations) = self.cache.reservations_by_hotel(hotel_id).await {
            return Ok(reservations);
        }

        let reservations = self.store.reservations_by_hotel(hotel_id).await?;
        for reservation in &reservations {
            self.cache.put_reservation(reservation).await;
        }
        Ok(reservations)
    }

    pub async fn reservations_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Reservation>, ServiceError> {
        if let Some(reservations) = self.cache.reservations_by_user(user_id).await {
            return Ok(reservations);
        }

        let reservations = self.store.reservations_by_user(user_id).await?;
        for reservation in &reservations {
            self.cache.put_reservation(reservation).await;
        }
        Ok(reservations)
    }

    pub async fn reservations_by_user_and_hotel(
        &self,
        hotel_id: &Uuid,
        user_id: &str,
    ) -> Result<Vec<Reservation>, ServiceError> {
        if let Some(reservations) = self
            .cache
            .reservations_by_user_and_hotel(hotel_id, user_id)
            .await
        {
            return Ok(reservations);
        }

        let reservations = self
            .store
            .reservations_by_user_and_hotel(hotel_id, user_id)
            .await?;
        for reservation in &reservations {
            self.cache.put_reservation(reservation).await;
        }
        Ok(reservations)
    }

    // --- availability ---

    /// Batch availability: one probe per hotel, collected over a channel
    /// sized to the batch.
    ///
    /// The cache path is taken only when every requested hotel is cached;
    /// there, per-hotel failures degrade to `false`. On the store path an
    /// unknown hotel answers `false` but a store failure fails the call.
    pub async fn availability(
        &self,
        hotel_ids: Vec<Uuid>,
        check_in: &str,
        check_out: &str,
    ) -> Result<HashMap<Uuid, bool>, ServiceError> {
        let stay = StayRange::parse(check_in, check_out)?;

        if hotel_ids.is_empty() {
            return Ok(HashMap::new());
        }

        if self.cache.contains_all_hotels(&hotel_ids).await {
            Ok(self.cache_availability(hotel_ids, stay).await)
        } else {
            self.store_availability(hotel_ids, stay).await
        }
    }

    async fn cache_availability(
        &self,
        hotel_ids: Vec<Uuid>,
        stay: StayRange,
    ) -> HashMap<Uuid, bool> {
        let (tx, mut rx) = mpsc::channel(hotel_ids.len());

        for hotel_id in &hotel_ids {
            let cache = Arc::clone(&self.cache);
            let tx = tx.clone();
            let hotel_id = *hotel_id;
            tokio::spawn(async move {
                let available = cache.is_hotel_available(&hotel_id, &stay).await;
                let _ = tx.send((hotel_id, available)).await;
            });
        }
        drop(tx);

        let mut availability = HashMap::with_capacity(hotel_ids.len());
        while let Some((hotel_id, available)) = rx.recv().await {
            availability.insert(hotel_id, available);
        }
        availability
    }

    async fn store_availability(
        &self,
        hotel_ids: Vec<Uuid>,
        stay: StayRange,
    ) -> Result<HashMap<Uuid, bool>, ServiceError> {
        let (tx, mut rx) = mpsc::channel(hotel_ids.len());

        for hotel_id in &hotel_ids {
            let store = Arc::clone(&self.store);
            let tx = tx.clone();
            let hotel_id = *hotel_id;
            tokio::spawn(async move {
                let result = store.is_hotel_available(&hotel_id, &stay).await;
                let _ = tx.send((hotel_id, result)).await;
            });
        }
        drop(tx);

        let mut availability = HashMap::with_capacity(hotel_ids.len());
        while let Some((hotel_id, result)) = rx.recv().await {
            match result {
                Ok(available) => {
                    availability.insert(hotel_id, available);
                }
                Err(e) if e.is_not_found() => {
                    availability.insert(hotel_id, false);
                }
                Err(e) => {
                    error!(hotel_id = %hotel_id, error = %e, "Availability probe failed");
                    return Err(ServiceError::Storage(e));
                }
            }
        }
        Ok(availability)
    }
}

/// Map a store `NotFound` to a service-level not-found with a readable
/// subject; pass other failures through.
fn not_found_or_storage(subject: String) -> impl FnOnce(StorageError) -> ServiceError {
    move |err| {
        if err.is_not_found() {
            ServiceError::not_found(subject)
        } else {
            ServiceError::Storage(err)
        }
    }
}

/// Periodically rebuild the cached per-hotel reservation lists from the
/// primary store, bounding drift between aggregate lists and individual
/// keys under partial failure. Runs until the shutdown signal fires.
pub async fn run_cache_rebuild(
    store: Arc<dyn InventoryStore>,
    cache: Arc<InventoryCache>,
    rebuild_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut tick = tokio::time::interval(rebuild_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it.
    tick.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Cache rebuild task received shutdown signal");
                break;
            }
            _ = tick.tick() => {
                let hotel_ids = cache.cached_hotel_ids();
                debug!(hotel_count = hotel_ids.len(), "Rebuilding cached reservation lists");

                for hotel_id in hotel_ids {
                    match store.reservations_by_hotel(&hotel_id).await {
                        Ok(reservations) => {
                            cache.replace_hotel_reservations(&hotel_id, reservations).await;
                        }
                        Err(e) => {
                            warn!(hotel_id = %hotel_id, error = %e, "Cache rebuild skipped hotel");
                        }
                    }
                }
            }
        }
    }
}
