//! Shared test doubles for the identity service.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use identity_api::cache::{CacheError, MemoryUserCache, UserCacheTier};
use identity_api::domain::UserRecord;
use identity_api::service::{UsersService, UsersServiceConfig};
use identity_api::storage::{StorageError, UserStore};

pub const SECRET: &str = "test-secret";

/// In-memory [`UserStore`] with the same semantics as the PostgreSQL
/// implementation, including unique usernames and assigned ids.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<i64, UserRecord>>,
    next_id: Mutex<i64>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_all(&self) -> Result<Vec<UserRecord>, StorageError> {
        let mut users: Vec<UserRecord> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn get_by_id(&self, id: i64) -> Result<UserRecord, StorageError> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("user {}", id)))
    }

    async fn get_by_username(&self, username: &str) -> Result<UserRecord, StorageError> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("user {}", username)))
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        tipo: &str,
    ) -> Result<i64, StorageError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.username == username) {
            return Err(StorageError::Duplicate(username.to_string()));
        }

        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = *next;

        users.insert(
            id,
            UserRecord {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                tipo: tipo.to_string(),
            },
        );
        Ok(id)
    }

    async fn update(&self, record: &UserRecord) -> Result<(), StorageError> {
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|u| u.username == record.username && u.id != record.id)
        {
            return Err(StorageError::Duplicate(record.username.clone()));
        }
        match users.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StorageError::not_found(format!("user {}", record.id))),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        self.users
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(format!("user {}", id)))
    }
}

/// A tier that always fails, to prove failures degrade to misses.
pub struct FailingTier;

#[async_trait]
impl UserCacheTier for FailingTier {
    async fn get_by_id(&self, _id: i64) -> Result<Option<UserRecord>, CacheError> {
        Err(CacheError::Backend("failing tier".to_string()))
    }

    async fn get_by_username(&self, _username: &str) -> Result<Option<UserRecord>, CacheError> {
        Err(CacheError::Backend("failing tier".to_string()))
    }

    async fn put(&self, _record: &UserRecord) -> Result<(), CacheError> {
        Err(CacheError::Backend("failing tier".to_string()))
    }

    async fn remove(&self, _id: i64, _username: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("failing tier".to_string()))
    }
}

/// Fully wired service over in-memory collaborators. Both cache tiers are
/// memory tiers here; the real L2 differs only in transport.
pub struct Harness {
    pub service: Arc<UsersService>,
    pub store: Arc<InMemoryUserStore>,
    pub l1: Arc<MemoryUserCache>,
    pub l2: Arc<MemoryUserCache>,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryUserStore::default());
    let l1 = Arc::new(MemoryUserCache::new(1000, Duration::from_secs(30)));
    let l2 = Arc::new(MemoryUserCache::new(1000, Duration::from_secs(30)));

    let service = Arc::new(UsersService::new(
        Arc::clone(&store) as Arc<dyn UserStore>,
        Arc::clone(&l1) as Arc<dyn UserCacheTier>,
        Arc::clone(&l2) as Arc<dyn UserCacheTier>,
        UsersServiceConfig {
            // Low cost keeps the suite fast; production defaults to 10.
            bcrypt_cost: 4,
            jwt_secret: SECRET.to_string(),
            token_duration: Duration::from_secs(3600),
        },
    ));

    Harness {
        service,
        store,
        l1,
        l2,
    }
}
