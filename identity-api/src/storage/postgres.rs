//! PostgreSQL implementation of the user store.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::domain::UserRecord;
use crate::storage::{StorageError, UserStore};

/// PostgreSQL-backed user store.
pub struct PostgresUserStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    tipo: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            tipo: row.tipo,
        }
    }
}

impl PostgresUserStore {
    /// Connect to the database and return a ready store.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                tipo TEXT NOT NULL DEFAULT 'cliente'
            )",
        )
        .execute(&self.pool)
        .await?;

        info!("Users schema ready");
        Ok(())
    }

    fn map_unique_violation(err: sqlx::Error, username: &str) -> StorageError {
        if let sqlx::Error::Database(ref db) = err {
            if db.is_unique_violation() {
                return StorageError::Duplicate(username.to_string());
            }
        }
        StorageError::Database(err)
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn get_all(&self) -> Result<Vec<UserRecord>, StorageError> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<UserRecord, StorageError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRecord::from)
            .ok_or_else(|| StorageError::not_found(format!("user {}", id)))
    }

    async fn get_by_username(&self, username: &str) -> Result<UserRecord, StorageError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRecord::from)
            .ok_or_else(|| StorageError::not_found(format!("user {}", username)))
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        tipo: &str,
    ) -> Result<i64, StorageError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, password_hash, tipo) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(tipo)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, username))?;

        Ok(id)
    }

    async fn update(&self, record: &UserRecord) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE users SET username = $2, password_hash = $3, tipo = $4 WHERE id = $1",
        )
        .bind(record.id)
        .bind(&record.username)
        .bind(&record.password_hash)
        .bind(&record.tipo)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique_violation(e, &record.username))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("user {}", record.id)));
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("user {}", id)));
        }

        Ok(())
    }
}
