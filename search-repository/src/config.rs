//! Configuration for the hotel index service.

/// Tunables for [`crate::HotelIndexService`].
#[derive(Debug, Clone)]
pub struct HotelIndexServiceConfig {
    /// Maximum `limit` a single search may request. `None` disables the cap.
    pub max_limit: Option<usize>,
}

impl Default for HotelIndexServiceConfig {
    fn default() -> Self {
        Self {
            max_limit: Some(100),
        }
    }
}

impl HotelIndexServiceConfig {
    /// A config with no limit cap. Not recommended outside tests.
    pub fn unlimited() -> Self {
        Self { max_limit: None }
    }

    /// A config with a custom limit cap.
    pub fn with_max_limit(max_limit: usize) -> Self {
        Self {
            max_limit: Some(max_limit),
        }
    }
}
