//! User store abstraction.

mod postgres;

pub use postgres::PostgresUserStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::UserRecord;

/// Errors from the user store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested user does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The username collides with an existing row.
    #[error("duplicate username: {0}")]
    Duplicate(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Authoritative persistence for users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<UserRecord>, StorageError>;

    async fn get_by_id(&self, id: i64) -> Result<UserRecord, StorageError>;

    async fn get_by_username(&self, username: &str) -> Result<UserRecord, StorageError>;

    /// Insert a user and return the assigned id. `Duplicate` on username
    /// collision.
    async fn create(&self, username: &str, password_hash: &str, tipo: &str)
        -> Result<i64, StorageError>;

    /// Overwrite a user row. `NotFound` when the id does not exist.
    async fn update(&self, record: &UserRecord) -> Result<(), StorageError>;

    async fn delete(&self, id: i64) -> Result<(), StorageError>;
}
