//! # Booking Shared
//!
//! Wire types shared between the services of the hotel booking platform.
//!
//! The inventory service, the search indexer and the identity service run as
//! independent processes and only agree on what travels between them: the
//! hotel and reservation JSON shapes, the change-event payload on the message
//! bus, and the signed token claims. Those contracts live here so no service
//! re-declares them.
//!
//! ## Modules
//!
//! - [`types`]: hotel, reservation and change-event wire types
//! - [`auth`]: token claims and role constants

pub mod auth;
pub mod types;

pub use auth::{is_valid_role, TokenClaims, ROLE_ADMIN, ROLE_CLIENT};
pub use types::{ChangeOperation, Hotel, HotelChangeEvent, Reservation};
