//! PostgreSQL implementation of the inventory store.
//!
//! Hotels and reservations live in two tables; the amenity and image
//! sequences are JSONB columns. Reservations are indexed by hotel and by
//! user because both aggregate listings are hot paths.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use booking_shared::{Hotel, Reservation};

use crate::availability::{fits_capacity, StayRange};
use crate::storage::{HotelUpdate, InventoryStore, StorageError};

/// PostgreSQL-backed inventory store.
pub struct PostgresInventoryStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct HotelRow {
    id: Uuid,
    name: String,
    description: String,
    address: String,
    city: String,
    state: String,
    country: String,
    phone: String,
    email: String,
    price_per_night: f64,
    rating: f64,
    available_rooms: i32,
    check_in_time: NaiveTime,
    check_out_time: NaiveTime,
    amenities: Json<Vec<String>>,
    images: Json<Vec<String>>,
}

impl From<HotelRow> for Hotel {
    fn from(row: HotelRow) -> Self {
        Hotel {
            id: row.id,
            name: row.name,
            description: row.description,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            phone: row.phone,
            email: row.email,
            price_per_night: row.price_per_night,
            rating: row.rating,
            available_rooms: row.available_rooms.max(0) as u32,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            amenities: row.amenities.0,
            images: row.images.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    hotel_id: Uuid,
    hotel_name: String,
    user_id: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: row.id,
            hotel_id: row.hotel_id,
            hotel_name: row.hotel_name,
            user_id: row.user_id,
            check_in: row.check_in,
            check_out: row.check_out,
        }
    }
}

impl PostgresInventoryStore {
    /// Connect to the database and return a ready store.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS hotels (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                address TEXT NOT NULL DEFAULT '',
                city TEXT NOT NULL DEFAULT '',
                state TEXT NOT NULL DEFAULT '',
                country TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                price_per_night DOUBLE PRECISION NOT NULL DEFAULT 0,
                rating DOUBLE PRECISION NOT NULL DEFAULT 0,
                available_rooms INTEGER NOT NULL DEFAULT 0,
                check_in_time TIME NOT NULL DEFAULT '15:00',
                check_out_time TIME NOT NULL DEFAULT '11:00',
                amenities JSONB NOT NULL DEFAULT '[]',
                images JSONB NOT NULL DEFAULT '[]'
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS reservations (
                id UUID PRIMARY KEY,
                hotel_id UUID NOT NULL,
                hotel_name TEXT NOT NULL DEFAULT '',
                user_id TEXT NOT NULL,
                check_in DATE NOT NULL,
                check_out DATE NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reservations_hotel ON reservations (hotel_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reservations_user ON reservations (user_id)")
            .execute(&self.pool)
            .await?;

        info!("Inventory schema ready");
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn hotel_by_id(&self, id: &Uuid) -> Result<Hotel, StorageError> {
        let row = sqlx::query_as::<_, HotelRow>("SELECT * FROM hotels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Hotel::from)
            .ok_or_else(|| StorageError::not_found(format!("hotel {}", id)))
    }

    async fn create_hotel(&self, hotel: &Hotel) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO hotels (
                id, name, description, address, city, state, country, phone, email,
                price_per_night, rating, available_rooms, check_in_time, check_out_time,
                amenities, images
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(hotel.id)
        .bind(&hotel.name)
        .bind(&hotel.description)
        .bind(&hotel.address)
        .bind(&hotel.city)
        .bind(&hotel.state)
        .bind(&hotel.country)
        .bind(&hotel.phone)
        .bind(&hotel.email)
        .bind(hotel.price_per_night)
        .bind(hotel.rating)
        .bind(hotel.available_rooms as i32)
        .bind(hotel.check_in_time)
        .bind(hotel.check_out_time)
        .bind(Json(&hotel.amenities))
        .bind(Json(&hotel.images))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_hotel(&self, id: &Uuid, update: &HotelUpdate) -> Result<(), StorageError> {
        if update.is_empty() {
            // Nothing to change; still report a missing hotel.
            return self.hotel_by_id(id).await.map(|_| ());
        }

        let mut builder = QueryBuilder::new("UPDATE hotels SET ");
        let mut fields = builder.separated(", ");

        if let Some(ref v) = update.name {
            fields.push("name = ").push_bind_unseparated(v);
        }
        if let Some(ref v) = update.description {
            fields.push("description = ").push_bind_unseparated(v);
        }
        if let Some(ref v) = update.address {
            fields.push("address = ").push_bind_unseparated(v);
        }
        if let Some(ref v) = update.city {
            fields.push("city = ").push_bind_unseparated(v);
        }
        if let Some(ref v) = update.state {
            fields.push("state = ").push_bind_unseparated(v);
        }
        if let Some(ref v) = update.country {
            fields.push("country = ").push_bind_unseparated(v);
        }
        if let Some(ref v) = update.phone {
            fields.push("phone = ").push_bind_unseparated(v);
        }
        if let Some(ref v) = update.email {
            fields.push("email = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.price_per_night {
            fields.push("price_per_night = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.rating {
            fields.push("rating = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.available_rooms {
            fields
                .push("available_rooms = ")
                .push_bind_unseparated(v as i32);
        }
        if let Some(v) = update.check_in_time {
            fields.push("check_in_time = ").push_bind_unseparated(v);
        }
        if let Some(v) = update.check_out_time {
            fields.push("check_out_time = ").push_bind_unseparated(v);
        }
        if let Some(ref v) = update.amenities {
            fields.push("amenities = ").push_bind_unseparated(Json(v));
        }
        if let Some(ref v) = update.images {
            fields.push("images = ").push_bind_unseparated(Json(v));
        }
        drop(fields);

        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("hotel {}", id)));
        }

        Ok(())
    }

    async fn delete_hotel(&self, id: &Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM hotels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("hotel {}", id)));
        }

        Ok(())
    }

    async fn create_reservation(&self, reservation: &Reservation) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO reservations (id, hotel_id, hotel_name, user_id, check_in, check_out)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(reservation.id)
        .bind(reservation.hotel_id)
        .bind(&reservation.hotel_name)
        .bind(&reservation.user_id)
        .bind(reservation.check_in)
        .bind(reservation.check_out)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reservation_by_id(&self, id: &Uuid) -> Result<Reservation, StorageError> {
        let row =
            sqlx::query_as::<_, ReservationRow>("SELECT * FROM reservations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Reservation::from)
            .ok_or_else(|| StorageError::not_found(format!("reservation {}", id)))
    }

    async fn cancel_reservation(&self, id: &Uuid) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("reservation {}", id)));
        }

        Ok(())
    }

    async fn reservations_by_hotel(&self, hotel_id: &Uuid) -> Result<Vec<Reservation>, StorageError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE hotel_id = $1 ORDER BY check_in, id",
        )
        .bind(hotel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn reservations_by_user(&self, user_id: &str) -> Result<Vec<Reservation>, StorageError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE user_id = $1 ORDER BY check_in, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn reservations_by_user_and_hotel(
        &self,
        hotel_id: &Uuid,
        user_id: &str,
    ) -> Result<Vec<Reservation>, StorageError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations WHERE hotel_id = $1 AND user_id = $2 ORDER BY check_in, id",
        )
        .bind(hotel_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn delete_reservations_by_hotel(&self, hotel_id: &Uuid) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM reservations WHERE hotel_id = $1")
            .bind(hotel_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn is_hotel_available(
        &self,
        hotel_id: &Uuid,
        stay: &StayRange,
    ) -> Result<bool, StorageError> {
        let capacity =
            sqlx::query_scalar::<_, i32>("SELECT available_rooms FROM hotels WHERE id = $1")
                .bind(hotel_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| StorageError::not_found(format!("hotel {}", hotel_id)))?;

        // Only reservations overlapping the request interval matter.
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT * FROM reservations
             WHERE hotel_id = $1 AND check_out > $2 AND check_in < $3",
        )
        .bind(hotel_id)
        .bind(stay.check_in)
        .bind(stay.check_out)
        .fetch_all(&self.pool)
        .await?;

        let reservations: Vec<Reservation> = rows.into_iter().map(Reservation::from).collect();
        Ok(fits_capacity(
            capacity.max(0) as u32,
            &reservations,
            stay,
        ))
    }
}
