//! OpenSearch backend for the hotel index.

mod index_config;
mod provider;

pub use index_config::{get_index_settings, versioned_index_name, IndexConfig};
pub use provider::OpenSearchProvider;
