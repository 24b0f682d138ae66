//! # Inventory API
//!
//! Authoritative store of hotels and reservations.
//!
//! Writes go to the primary store first, then fan out to the in-process
//! cache and to the message bus as change events; readers walk the cache
//! before falling back to the store. The availability engine answers
//! per-night capacity questions over concurrent date ranges with one probe
//! per hotel.
//!
//! ## Modules
//!
//! - [`availability`]: night-histogram capacity arithmetic
//! - [`cache`]: write-through in-process cache
//! - [`config`]: environment configuration
//! - [`errors`]: service-level error type
//! - [`events`]: change-event publisher for the bus
//! - [`http`]: axum routes and token-verification middleware
//! - [`service`]: orchestration of store, cache and publisher
//! - [`storage`]: primary-store trait and PostgreSQL implementation

pub mod availability;
pub mod cache;
pub mod config;
pub mod errors;
pub mod events;
pub mod http;
pub mod service;
pub mod storage;

pub use config::InventoryConfig;
pub use errors::ServiceError;
pub use service::HotelsService;
