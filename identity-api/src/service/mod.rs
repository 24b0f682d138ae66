//! The users service: read-through over the two cache tiers, bcrypt
//! credential path, token issuance.
//!
//! Reads walk L1 → L2 → store, writing the record back into every tier it
//! missed in. Writes go to the store first; cache population and
//! invalidation are best-effort and never fail the operation.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use booking_shared::{is_valid_role, ROLE_CLIENT};

use crate::auth::{generate_token, hash_password, verify_password};
use crate::cache::UserCacheTier;
use crate::domain::{LoginResponse, NewUser, User, UserRecord, UserUpdate};
use crate::errors::IdentityError;
use crate::storage::UserStore;

/// Tunables for the users service.
#[derive(Debug, Clone)]
pub struct UsersServiceConfig {
    /// bcrypt cost factor; 0 selects the bcrypt default.
    pub bcrypt_cost: u32,
    /// Secret for HMAC token signing.
    pub jwt_secret: String,
    /// Token lifetime.
    pub token_duration: Duration,
}

/// The identity service.
pub struct UsersService {
    store: Arc<dyn UserStore>,
    l1: Arc<dyn UserCacheTier>,
    l2: Arc<dyn UserCacheTier>,
    config: UsersServiceConfig,
}

impl UsersService {
    pub fn new(
        store: Arc<dyn UserStore>,
        l1: Arc<dyn UserCacheTier>,
        l2: Arc<dyn UserCacheTier>,
        config: UsersServiceConfig,
    ) -> Self {
        Self {
            store,
            l1,
            l2,
            config,
        }
    }

    /// Register a user. The role defaults to client; the password is
    /// bcrypt-hashed before it leaves this function.
    pub async fn register(&self, request: NewUser) -> Result<i64, IdentityError> {
        if request.username.trim().is_empty() {
            return Err(IdentityError::validation("username is required"));
        }
        if request.password.is_empty() {
            return Err(IdentityError::validation("password is required"));
        }

        let tipo = request.tipo.unwrap_or_else(|| ROLE_CLIENT.to_string());
        if !is_valid_role(&tipo) {
            return Err(IdentityError::validation(format!("invalid tipo: {}", tipo)));
        }

        let password_hash = hash_password(&request.password, self.config.bcrypt_cost)?;

        let id = self
            .store
            .create(&request.username, &password_hash, &tipo)
            .await?;

        let record = UserRecord {
            id,
            username: request.username,
            password_hash,
            tipo,
        };
        self.populate_caches(&record).await;

        info!(user_id = id, "User registered");
        Ok(id)
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown user and wrong password are deliberately the same error.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, IdentityError> {
        if username.is_empty() || password.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }

        let record = match self.get_record_by_username(username).await {
            Ok(record) => record,
            Err(IdentityError::NotFound(_)) => return Err(IdentityError::InvalidCredentials),
            Err(other) => return Err(other),
        };

        if !verify_password(password, &record.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }

        let token = generate_token(
            &record.username,
            record.id,
            &record.tipo,
            &self.config.jwt_secret,
            self.config.token_duration,
        )?;

        Ok(LoginResponse {
            user_id: record.id,
            username: record.username,
            token,
            tipo: record.tipo,
        })
    }

    /// All users, passwords stripped. Served from the store; aggregate
    /// listings are not cached.
    pub async fn get_all(&self) -> Result<Vec<User>, IdentityError> {
        let records = self.store.get_all().await?;
        Ok(records.into_iter().map(User::from).collect())
    }

    /// A user by id, passwords stripped.
    pub async fn get_by_id(&self, id: i64) -> Result<User, IdentityError> {
        Ok(User::from(self.get_record_by_id(id).await?))
    }

    /// A user by username, passwords stripped.
    pub async fn get_by_username(&self, username: &str) -> Result<User, IdentityError> {
        Ok(User::from(self.get_record_by_username(username).await?))
    }

    /// Update a user: re-hash the password when provided, re-validate the
    /// role, then refresh the caches (purging the old username key).
    pub async fn update(&self, id: i64, update: UserUpdate) -> Result<(), IdentityError> {
        let current = self.get_record_by_id(id).await?;

        let mut record = current.clone();
        if let Some(username) = update.username {
            if username.trim().is_empty() {
                return Err(IdentityError::validation("username is required"));
            }
            record.username = username;
        }
        if let Some(password) = update.password {
            if password.is_empty() {
                return Err(IdentityError::validation("password is required"));
            }
            record.password_hash = hash_password(&password, self.config.bcrypt_cost)?;
        }
        if let Some(tipo) = update.tipo {
            if !is_valid_role(&tipo) {
                return Err(IdentityError::validation(format!("invalid tipo: {}", tipo)));
            }
            record.tipo = tipo;
        }

        self.store.update(&record).await?;

        self.invalidate_caches(current.id, &current.username).await;
        self.populate_caches(&record).await;

        info!(user_id = id, "User updated");
        Ok(())
    }

    /// Delete a user, then purge both keys from both tiers.
    ///
    /// The current record is read first so the username key can be purged
    /// as well.
    pub async fn delete(&self, id: i64) -> Result<(), IdentityError> {
        let record = self.get_record_by_id(id).await?;

        self.store.delete(id).await?;
        self.invalidate_caches(record.id, &record.username).await;

        info!(user_id = id, "User deleted");
        Ok(())
    }

    // --- read-through plumbing ---

    async fn get_record_by_id(&self, id: i64) -> Result<UserRecord, IdentityError> {
        match self.l1.get_by_id(id).await {
            Ok(Some(record)) => return Ok(record),
            Ok(None) => {}
            Err(e) => warn!(error = %e, user_id = id, "L1 read failed"),
        }

        match self.l2.get_by_id(id).await {
            Ok(Some(record)) => {
                if let Err(e) = self.l1.put(&record).await {
                    warn!(error = %e, user_id = id, "L1 back-fill failed");
                }
                return Ok(record);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, user_id = id, "L2 read failed"),
        }

        let record = self.store.get_by_id(id).await?;
        self.populate_caches(&record).await;
        Ok(record)
    }

    async fn get_record_by_username(&self, username: &str) -> Result<UserRecord, IdentityError> {
        match self.l1.get_by_username(username).await {
            Ok(Some(record)) => return Ok(record),
            Ok(None) => {}
            Err(e) => warn!(error = %e, username = %username, "L1 read failed"),
        }

        match self.l2.get_by_username(username).await {
            Ok(Some(record)) => {
                if let Err(e) = self.l1.put(&record).await {
                    warn!(error = %e, username = %username, "L1 back-fill failed");
                }
                return Ok(record);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, username = %username, "L2 read failed"),
        }

        let record = self.store.get_by_username(username).await?;
        self.populate_caches(&record).await;
        Ok(record)
    }

    async fn populate_caches(&self, record: &UserRecord) {
        if let Err(e) = self.l1.put(record).await {
            warn!(error = %e, user_id = record.id, "L1 populate failed");
        }
        if let Err(e) = self.l2.put(record).await {
            warn!(error = %e, user_id = record.id, "L2 populate failed");
        }
    }

    async fn invalidate_caches(&self, id: i64, username: &str) {
        if let Err(e) = self.l1.remove(id, username).await {
            warn!(error = %e, user_id = id, "L1 invalidate failed");
        }
        if let Err(e) = self.l2.remove(id, username).await {
            warn!(error = %e, user_id = id, "L2 invalidate failed");
        }
    }
}
