//! Configuration and dependency wiring for the search indexer.

mod dependencies;

pub use dependencies::{ConnectionMode, Dependencies};
