//! Wire types shared across services.

mod change_event;
mod hotel;
mod reservation;

pub use change_event::{ChangeOperation, HotelChangeEvent};
pub use hotel::Hotel;
pub use reservation::Reservation;
