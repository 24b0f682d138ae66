//! # Search Repository
//!
//! Search index abstraction for hotel documents.
//!
//! The [`HotelIndexProvider`] trait defines the operations the indexer and
//! the search API need; [`opensearch::OpenSearchProvider`] is the production
//! backend. Application code goes through [`HotelIndexService`], which adds
//! input validation on top of whichever provider it was built with, so tests
//! can substitute a mock provider.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod service;
pub mod types;

pub use self::opensearch::{IndexConfig, OpenSearchProvider};
pub use config::HotelIndexServiceConfig;
pub use errors::SearchIndexError;
pub use interfaces::HotelIndexProvider;
pub use service::HotelIndexService;
pub use types::HotelDocument;
