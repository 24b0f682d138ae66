//! The two user-cache tiers.
//!
//! Both tiers key the same record twice, by id and by username:
//!
//! - `user:id:<id>`
//! - `user:username:<name>`
//!
//! A tier failure is never surfaced to callers of the service; the caller
//! advances to the next tier (or the store) and the failure is logged.

mod memory;
mod redis;

pub use self::redis::RedisUserCache;
pub use memory::MemoryUserCache;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::UserRecord;

/// Errors from a cache tier. Informational only; the read path treats any
/// error as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend rejected or dropped the operation.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Value (de)serialization failed.
    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key for the id index.
pub fn id_key(id: i64) -> String {
    format!("user:id:{}", id)
}

/// Key for the username index.
pub fn username_key(username: &str) -> String {
    format!("user:username:{}", username)
}

/// One tier of the user cache.
#[async_trait]
pub trait UserCacheTier: Send + Sync {
    /// Look up by id. `Ok(None)` is a miss.
    async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>, CacheError>;

    /// Look up by username. `Ok(None)` is a miss.
    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, CacheError>;

    /// Store the record under both keys.
    async fn put(&self, record: &UserRecord) -> Result<(), CacheError>;

    /// Remove both keys.
    async fn remove(&self, id: i64, username: &str) -> Result<(), CacheError>;
}
