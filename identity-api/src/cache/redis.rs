//! Distributed user cache tier (L2) over Redis.
//!
//! Values are JSON-serialized [`UserRecord`]s with a TTL; keys match the
//! in-process tier so the two stay interchangeable.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use crate::cache::{id_key, username_key, CacheError, UserCacheTier};
use crate::domain::UserRecord;

/// Redis-backed cache tier.
pub struct RedisUserCache {
    conn_manager: ConnectionManager,
    ttl: Duration,
}

impl RedisUserCache {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - connection URL (e.g. "redis://127.0.0.1:6379")
    /// * `ttl` - entry time-to-live
    pub async fn connect(redis_url: &str, ttl: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Backend(format!("failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Backend(format!("failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager, ttl })
    }

    async fn get_key(&self, key: &str) -> Result<Option<UserRecord>, CacheError> {
        let mut conn = self.conn_manager.clone();
        let raw: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserCacheTier for RedisUserCache {
    async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>, CacheError> {
        self.get_key(&id_key(id)).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, CacheError> {
        self.get_key(&username_key(username)).await
    }

    async fn put(&self, record: &UserRecord) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        let json = serde_json::to_string(record)?;
        let ttl_secs = self.ttl.as_secs().max(1);

        let _: () = conn
            .set_ex(id_key(record.id), &json, ttl_secs)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let _: () = conn
            .set_ex(username_key(&record.username), &json, ttl_secs)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, id: i64, username: &str) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();

        let _: () = conn
            .del(&[id_key(id), username_key(username)])
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(())
    }
}
