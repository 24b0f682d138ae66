//! Service-level scenarios: availability arithmetic end to end, the
//! write-through order, the delete cascade, and failure propagation.

mod common;

use booking_shared::ChangeOperation;
use common::{harness, new_hotel, new_reservation};
use inventory_api::storage::HotelUpdate;
use inventory_api::ServiceError;
use std::sync::atomic::Ordering;
use uuid::Uuid;

#[tokio::test]
async fn occupied_night_excludes_checkout() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 1)).await.unwrap();

    h.service
        .create_reservation(new_reservation(hotel_id, "1", "2024-01-01", "2024-01-02"))
        .await
        .unwrap();

    let taken = h
        .service
        .availability(vec![hotel_id], "2024-01-01", "2024-01-02")
        .await
        .unwrap();
    assert_eq!(taken.get(&hotel_id), Some(&false));

    let free = h
        .service
        .availability(vec![hotel_id], "2024-01-02", "2024-01-03")
        .await
        .unwrap();
    assert_eq!(free.get(&hotel_id), Some(&true));
}

#[tokio::test]
async fn capacity_threshold_and_cancellation_monotonicity() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 2)).await.unwrap();

    let r1 = h
        .service
        .create_reservation(new_reservation(hotel_id, "1", "2025-10-20", "2025-10-21"))
        .await
        .unwrap();
    let r2 = h
        .service
        .create_reservation(new_reservation(hotel_id, "2", "2025-10-20", "2025-10-21"))
        .await
        .unwrap();

    let full = h
        .service
        .availability(vec![hotel_id], "2025-10-20", "2025-10-21")
        .await
        .unwrap();
    assert_eq!(full.get(&hotel_id), Some(&false));

    // Cancelling can only flip availability false → true, never back.
    h.service.cancel_reservation(&r1.id).await.unwrap();
    h.service.cancel_reservation(&r2.id).await.unwrap();

    let free = h
        .service
        .availability(vec![hotel_id], "2025-10-20", "2025-10-21")
        .await
        .unwrap();
    assert_eq!(free.get(&hotel_id), Some(&true));
}

#[tokio::test]
async fn full_hotel_rejects_a_new_reservation() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 1)).await.unwrap();

    h.service
        .create_reservation(new_reservation(hotel_id, "1", "2024-01-01", "2024-01-02"))
        .await
        .unwrap();

    let result = h
        .service
        .create_reservation(new_reservation(hotel_id, "2", "2024-01-01", "2024-01-02"))
        .await;
    assert!(matches!(result, Err(ServiceError::Unavailable(_))));
}

#[tokio::test]
async fn malformed_dates_are_rejected() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 1)).await.unwrap();

    let result = h
        .service
        .availability(vec![hotel_id], "01-01-2024", "2024-01-02")
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let result = h
        .service
        .create_reservation(new_reservation(hotel_id, "1", "2024-01-02", "2024-01-01"))
        .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[tokio::test]
async fn unknown_hotel_reports_false_in_availability() {
    let h = harness();
    let known = h.service.create_hotel(new_hotel("Grand Plaza", 1)).await.unwrap();
    let unknown = Uuid::new_v4();

    let map = h
        .service
        .availability(vec![known, unknown], "2024-01-01", "2024-01-02")
        .await
        .unwrap();
    assert_eq!(map.get(&known), Some(&true));
    assert_eq!(map.get(&unknown), Some(&false));
}

#[tokio::test]
async fn cold_cache_reservation_list_degrades_to_false() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 5)).await.unwrap();

    // The hotel itself is cached by the write-through, so the cache path is
    // taken; its reservation list was never populated, which must read as
    // unavailable rather than as an empty hotel.
    let map = h
        .service
        .availability(vec![hotel_id], "2024-06-01", "2024-06-02")
        .await
        .unwrap();
    assert_eq!(map.get(&hotel_id), Some(&false));

    // After the list is warmed from the store, the truth comes back.
    h.service.reservations_by_hotel(&hotel_id).await.unwrap();
    h.service
        .create_reservation(new_reservation(hotel_id, "1", "2024-06-01", "2024-06-02"))
        .await
        .unwrap();
    let map = h
        .service
        .availability(vec![hotel_id], "2024-06-01", "2024-06-02")
        .await
        .unwrap();
    assert_eq!(map.get(&hotel_id), Some(&true));
}

#[tokio::test]
async fn create_emits_event_and_writes_through_the_cache() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 3)).await.unwrap();

    let events = h.publisher.events.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].operation, ChangeOperation::Create);
    assert_eq!(events[0].hotel_id, hotel_id);

    // Wipe the primary store: a read must still be served from the cache.
    h.store.hotels.lock().unwrap().clear();
    let cached = h.service.hotel_by_id(&hotel_id).await.unwrap();
    assert_eq!(cached.name, "Grand Plaza");
}

#[tokio::test]
async fn update_merges_store_and_cache_and_emits() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 3)).await.unwrap();

    let update: HotelUpdate =
        serde_json::from_str(r#"{"name": "Grander Plaza", "avaiable_rooms": 9}"#).unwrap();
    h.service.update_hotel(&hotel_id, update).await.unwrap();

    let stored = h.store.hotels.lock().unwrap().get(&hotel_id).cloned().unwrap();
    assert_eq!(stored.name, "Grander Plaza");
    assert_eq!(stored.available_rooms, 9);
    // Untouched fields survive the merge.
    assert_eq!(stored.city, "Mar del Plata");

    let cached = h.cache.hotel_by_id(&hotel_id).await.unwrap();
    assert_eq!(cached.available_rooms, 9);

    let events = h.publisher.events.lock().unwrap();
    assert_eq!(events.last().unwrap().operation, ChangeOperation::Update);
}

#[tokio::test]
async fn delete_cascades_reservations_everywhere() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 3)).await.unwrap();

    let r1 = h
        .service
        .create_reservation(new_reservation(hotel_id, "1", "2024-01-01", "2024-01-03"))
        .await
        .unwrap();
    let r2 = h
        .service
        .create_reservation(new_reservation(hotel_id, "2", "2024-02-01", "2024-02-03"))
        .await
        .unwrap();

    h.service.delete_hotel(&hotel_id).await.unwrap();

    // Primary store: hotel row and every reservation are gone.
    assert!(h.store.hotels.lock().unwrap().is_empty());
    assert!(h.store.reservations.lock().unwrap().is_empty());

    // Cache: no surviving entry for the hotel or its reservations.
    assert!(h.cache.hotel_by_id(&hotel_id).await.is_none());
    assert!(h.cache.reservation_by_id(&r1.id).await.is_none());
    assert!(h.cache.reservation_by_id(&r2.id).await.is_none());
    assert!(h.cache.reservations_by_hotel(&hotel_id).await.is_none());

    // The hotel listing read degrades to empty, not to stale data.
    let listed = h.service.reservations_by_hotel(&hotel_id).await.unwrap();
    assert!(listed.is_empty());

    let events = h.publisher.events.lock().unwrap();
    assert_eq!(events.last().unwrap().operation, ChangeOperation::Delete);
}

#[tokio::test]
async fn publish_failure_fails_the_mutation_but_keeps_the_store() {
    let h = harness();
    h.publisher.fail.store(true, Ordering::SeqCst);

    let result = h.service.create_hotel(new_hotel("Grand Plaza", 3)).await;
    assert!(matches!(result, Err(ServiceError::Publish(_))));

    // The primary store kept the row; the caller retries the publish.
    assert_eq!(h.store.hotels.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn reservation_denormalizes_hotel_name() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 3)).await.unwrap();

    let reservation = h
        .service
        .create_reservation(new_reservation(hotel_id, "1", "2024-01-01", "2024-01-02"))
        .await
        .unwrap();
    assert_eq!(reservation.hotel_name, "Grand Plaza");
}

#[tokio::test]
async fn user_listings_come_back_from_cache_and_store() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 5)).await.unwrap();

    h.service
        .create_reservation(new_reservation(hotel_id, "7", "2024-01-01", "2024-01-02"))
        .await
        .unwrap();
    h.service
        .create_reservation(new_reservation(hotel_id, "7", "2024-03-01", "2024-03-02"))
        .await
        .unwrap();
    h.service
        .create_reservation(new_reservation(hotel_id, "8", "2024-01-01", "2024-01-02"))
        .await
        .unwrap();

    assert_eq!(h.service.reservations_by_user("7").await.unwrap().len(), 2);
    assert_eq!(
        h.service
            .reservations_by_user_and_hotel(&hotel_id, "8")
            .await
            .unwrap()
            .len(),
        1
    );

    // Cold-cache path: clear the cache lists by using a fresh harness cache
    // via direct store reads.
    assert_eq!(h.store.reservations.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn store_failure_propagates_from_availability() {
    let h = harness();
    let hotel_id = h.service.create_hotel(new_hotel("Grand Plaza", 1)).await.unwrap();

    // Force the store path by asking about an uncached hotel id as well.
    h.store.fail.store(true, Ordering::SeqCst);
    let result = h
        .service
        .availability(vec![hotel_id, Uuid::new_v4()], "2024-01-01", "2024-01-02")
        .await;
    assert!(matches!(result, Err(ServiceError::Storage(_))));
}
