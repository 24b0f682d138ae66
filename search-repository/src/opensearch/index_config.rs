//! OpenSearch index configuration and mappings for hotel documents.

use serde_json::{json, Value};

/// Configuration for the hotel search index.
///
/// All operations address the `alias`; the physical index carries a version
/// suffix (`hotels_v0`) so mappings can be migrated by reindexing into a new
/// version and repointing the alias.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The alias name used for all operations.
    pub alias: String,
    /// The version number of the physical index.
    pub version: u32,
}

impl IndexConfig {
    /// Create a new index configuration.
    pub fn new(alias: impl Into<String>, version: u32) -> Self {
        Self {
            alias: alias.into(),
            version,
        }
    }

    /// The versioned physical index name (e.g. `hotels_v0`).
    pub fn index_name(&self) -> String {
        versioned_index_name(&self.alias, self.version)
    }
}

/// Build the versioned index name for an alias.
pub fn versioned_index_name(alias: &str, version: u32) -> String {
    format!("{}_v{}", alias, version)
}

/// Index settings and mappings for the hotel search index.
///
/// `name` and `description` are the full-text search fields; ids and image
/// URIs are keywords; numeric hotel attributes are stored so search results
/// can be served entirely from the index without another fetch.
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "name": {
                    "type": "text",
                    "fields": {
                        "raw": { "type": "keyword" }
                    }
                },
                "description": { "type": "text" },
                "address": { "type": "text" },
                "city": { "type": "keyword" },
                "state": { "type": "keyword" },
                "country": { "type": "keyword" },
                "phone": { "type": "keyword", "index": false },
                "email": { "type": "keyword", "index": false },
                "price_per_night": { "type": "double" },
                "rating": { "type": "double" },
                "avaiable_rooms": { "type": "integer" },
                "check_in_time": { "type": "keyword", "index": false },
                "check_out_time": { "type": "keyword", "index": false },
                "amenities": { "type": "keyword" },
                "images": { "type": "keyword", "index": false },
                "indexed_at": { "type": "date" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_name_appends_version() {
        assert_eq!(versioned_index_name("hotels", 0), "hotels_v0");
        assert_eq!(versioned_index_name("hotels", 3), "hotels_v3");
        assert_eq!(IndexConfig::new("hotels", 1).index_name(), "hotels_v1");
    }

    #[test]
    fn mappings_cover_the_search_fields() {
        let settings = get_index_settings();
        assert_eq!(settings["mappings"]["properties"]["name"]["type"], "text");
        assert_eq!(
            settings["mappings"]["properties"]["description"]["type"],
            "text"
        );
        assert_eq!(
            settings["mappings"]["properties"]["avaiable_rooms"]["type"],
            "integer"
        );
        assert!(settings["settings"]["number_of_shards"].is_number());
    }
}
