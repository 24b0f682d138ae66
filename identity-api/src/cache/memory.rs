//! In-process user cache tier (L1).

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use crate::cache::{id_key, username_key, CacheError, UserCacheTier};
use crate::domain::UserRecord;

/// Size- and TTL-bounded in-process tier.
pub struct MemoryUserCache {
    entries: Cache<String, UserRecord>,
}

impl MemoryUserCache {
    /// Create a tier bounded by entry count and TTL.
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl UserCacheTier for MemoryUserCache {
    async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>, CacheError> {
        Ok(self.entries.get(&id_key(id)).await)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, CacheError> {
        Ok(self.entries.get(&username_key(username)).await)
    }

    async fn put(&self, record: &UserRecord) -> Result<(), CacheError> {
        self.entries.insert(id_key(record.id), record.clone()).await;
        self.entries
            .insert(username_key(&record.username), record.clone())
            .await;
        Ok(())
    }

    async fn remove(&self, id: i64, username: &str) -> Result<(), CacheError> {
        self.entries.invalidate(&id_key(id)).await;
        self.entries.invalidate(&username_key(username)).await;
        Ok(())
    }
}
