//! Write-through in-process cache for hotels and reservations.
//!
//! Keys follow a fixed format so operators can reason about what is cached:
//!
//! - `hotel:<id>` → hotel record
//! - `reservation:<id>` → reservation record
//! - `reservations:hotel:<hotelId>` → reservations of a hotel
//! - `reservations:user:<userId>` → reservations of a user
//! - `reservations:hotel:<hotelId>:user:<userId>` → reservations of the pair
//!
//! Every reservation write touches its individual key and all three
//! aggregate lists. List mutations are read-modify-write and therefore
//! serialized behind a mutex; they are idempotent on reservation id, so a
//! replayed write replaces in place instead of duplicating.

use moka::future::Cache;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use booking_shared::{Hotel, Reservation};

use crate::availability::{fits_capacity, StayRange};
use crate::storage::HotelUpdate;

/// Configuration for the in-process cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries per keyspace.
    pub max_capacity: u64,
    /// Entry time-to-live.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 100_000,
            ttl: Duration::from_secs(30),
        }
    }
}

/// Size- and TTL-bounded cache over hotels, reservations and the derived
/// reservation lists.
pub struct InventoryCache {
    hotels: Cache<String, Hotel>,
    reservations: Cache<String, Reservation>,
    reservation_lists: Cache<String, Vec<Reservation>>,
    /// Serializes read-modify-write cycles on the aggregate lists.
    lists_lock: Mutex<()>,
}

fn hotel_key(id: &Uuid) -> String {
    format!("hotel:{}", id)
}

fn reservation_key(id: &Uuid) -> String {
    format!("reservation:{}", id)
}

fn hotel_list_key(hotel_id: &Uuid) -> String {
    format!("reservations:hotel:{}", hotel_id)
}

fn user_list_key(user_id: &str) -> String {
    format!("reservations:user:{}", user_id)
}

fn user_hotel_list_key(hotel_id: &Uuid, user_id: &str) -> String {
    format!("reservations:hotel:{}:user:{}", hotel_id, user_id)
}

impl InventoryCache {
    /// Create a cache with the given bounds.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            hotels: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.ttl)
                .build(),
            reservations: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.ttl)
                .build(),
            reservation_lists: Cache::builder()
                .max_capacity(config.max_capacity)
                .time_to_live(config.ttl)
                .build(),
            lists_lock: Mutex::new(()),
        }
    }

    // --- hotels ---

    pub async fn hotel_by_id(&self, id: &Uuid) -> Option<Hotel> {
        self.hotels.get(&hotel_key(id)).await
    }

    pub async fn put_hotel(&self, hotel: &Hotel) {
        self.hotels.insert(hotel_key(&hotel.id), hotel.clone()).await;
    }

    /// Merge a partial update into the cached record, if present.
    ///
    /// Returns whether a cached record existed. A miss is not an error;
    /// the next read repopulates from the primary store.
    pub async fn apply_hotel_update(&self, id: &Uuid, update: &HotelUpdate) -> bool {
        let key = hotel_key(id);
        match self.hotels.get(&key).await {
            Some(mut hotel) => {
                update.apply_to(&mut hotel);
                self.hotels.insert(key, hotel).await;
                true
            }
            None => false,
        }
    }

    pub async fn remove_hotel(&self, id: &Uuid) {
        self.hotels.invalidate(&hotel_key(id)).await;
    }

    pub async fn contains_hotel(&self, id: &Uuid) -> bool {
        self.hotels.contains_key(&hotel_key(id))
    }

    /// Ids of all hotels currently cached. Used by the periodic list rebuild.
    pub fn cached_hotel_ids(&self) -> Vec<Uuid> {
        self.hotels
            .iter()
            .filter_map(|(key, _)| {
                key.strip_prefix("hotel:")
                    .and_then(|raw| Uuid::parse_str(raw).ok())
            })
            .collect()
    }

    // --- reservations ---

    pub async fn reservation_by_id(&self, id: &Uuid) -> Option<Reservation> {
        self.reservations.get(&reservation_key(id)).await
    }

    /// Store a reservation and fold it into the three aggregate lists.
    pub async fn put_reservation(&self, reservation: &Reservation) {
        self.reservations
            .insert(reservation_key(&reservation.id), reservation.clone())
            .await;

        let _guard = self.lists_lock.lock().await;
        self.upsert_into_list(hotel_list_key(&reservation.hotel_id), reservation)
            .await;
        self.upsert_into_list(user_list_key(&reservation.user_id), reservation)
            .await;
        self.upsert_into_list(
            user_hotel_list_key(&reservation.hotel_id, &reservation.user_id),
            reservation,
        )
        .await;
    }

    /// Drop a reservation and scrub it from the aggregate lists.
    pub async fn remove_reservation(&self, id: &Uuid) {
        let key = reservation_key(id);
        let reservation = self.reservations.get(&key).await;
        self.reservations.invalidate(&key).await;

        // Without the cached record the list memberships are unknown; the
        // TTL bounds how long the stale list entries survive.
        let Some(reservation) = reservation else {
            return;
        };

        let _guard = self.lists_lock.lock().await;
        self.drop_from_list(hotel_list_key(&reservation.hotel_id), id)
            .await;
        self.drop_from_list(user_list_key(&reservation.user_id), id)
            .await;
        self.drop_from_list(
            user_hotel_list_key(&reservation.hotel_id, &reservation.user_id),
            id,
        )
        .await;
    }

    pub async fn reservations_by_hotel(&self, hotel_id: &Uuid) -> Option<Vec<Reservation>> {
        self.reservation_lists.get(&hotel_list_key(hotel_id)).await
    }

    pub async fn reservations_by_user(&self, user_id: &str) -> Option<Vec<Reservation>> {
        self.reservation_lists.get(&user_list_key(user_id)).await
    }

    pub async fn reservations_by_user_and_hotel(
        &self,
        hotel_id: &Uuid,
        user_id: &str,
    ) -> Option<Vec<Reservation>> {
        self.reservation_lists
            .get(&user_hotel_list_key(hotel_id, user_id))
            .await
    }

    /// Authoritatively replace a hotel's reservation list (and the
    /// individual keys) from the primary store.
    pub async fn replace_hotel_reservations(&self, hotel_id: &Uuid, reservations: Vec<Reservation>) {
        let _guard = self.lists_lock.lock().await;

        for reservation in &reservations {
            self.reservations
                .insert(reservation_key(&reservation.id), reservation.clone())
                .await;
        }

        let key = hotel_list_key(hotel_id);
        if reservations.is_empty() {
            self.reservation_lists.invalidate(&key).await;
        } else {
            self.reservation_lists.insert(key, reservations).await;
        }
    }

    /// Cascade for a hotel delete: purge every reservation of the hotel
    /// from the individual keys and the per-user aggregates, then drop the
    /// hotel list itself.
    pub async fn remove_hotel_reservations(&self, hotel_id: &Uuid) {
        let hotel_list = self
            .reservation_lists
            .get(&hotel_list_key(hotel_id))
            .await
            .unwrap_or_default();

        let _guard = self.lists_lock.lock().await;
        for reservation in &hotel_list {
            self.reservations
                .invalidate(&reservation_key(&reservation.id))
                .await;
            self.drop_from_list(user_list_key(&reservation.user_id), &reservation.id)
                .await;
            self.drop_from_list(
                user_hotel_list_key(hotel_id, &reservation.user_id),
                &reservation.id,
            )
            .await;
        }

        self.reservation_lists
            .invalidate(&hotel_list_key(hotel_id))
            .await;
    }

    // --- availability ---

    /// Whether every requested hotel is present in the cache.
    ///
    /// The availability fast path requires all of them; otherwise the whole
    /// query fails over to the primary store.
    pub async fn contains_all_hotels(&self, hotel_ids: &[Uuid]) -> bool {
        for id in hotel_ids {
            if !self.contains_hotel(id).await {
                return false;
            }
        }
        true
    }

    /// Availability of a single hotel from cached data only.
    ///
    /// A missing hotel or a missing reservation list answers `false`: a cold
    /// cache must never report a room it cannot account for.
    pub async fn is_hotel_available(&self, hotel_id: &Uuid, stay: &StayRange) -> bool {
        let Some(hotel) = self.hotel_by_id(hotel_id).await else {
            return false;
        };

        let Some(reservations) = self.reservations_by_hotel(hotel_id).await else {
            return false;
        };

        fits_capacity(hotel.available_rooms, &reservations, stay)
    }

    // --- list plumbing (callers hold `lists_lock`) ---

    async fn upsert_into_list(&self, key: String, reservation: &Reservation) {
        let mut list = self.reservation_lists.get(&key).await.unwrap_or_default();

        match list.iter_mut().find(|r| r.id == reservation.id) {
            Some(existing) => *existing = reservation.clone(),
            None => list.push(reservation.clone()),
        }

        self.reservation_lists.insert(key, list).await;
    }

    async fn drop_from_list(&self, key: String, reservation_id: &Uuid) {
        let Some(mut list) = self.reservation_lists.get(&key).await else {
            return;
        };

        list.retain(|r| r.id != *reservation_id);

        if list.is_empty() {
            self.reservation_lists.invalidate(&key).await;
        } else {
            self.reservation_lists.insert(key, list).await;
        }
    }
}
