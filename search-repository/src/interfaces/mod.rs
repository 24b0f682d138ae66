//! Abstract interfaces over the search backend.

mod hotel_index_provider;

pub use hotel_index_provider::HotelIndexProvider;
