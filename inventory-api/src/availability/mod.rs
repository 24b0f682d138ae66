//! Availability arithmetic over concurrent date ranges.
//!
//! Dates are plain calendar days. A reservation `[check_in, check_out)`
//! occupies the nights `check_in .. check_out - 1`: the checkout day is
//! exclusive on both sides, so a stay starting on another stay's checkout
//! day does not conflict.

use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

use booking_shared::Reservation;

/// Wire format for stay dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from stay-range validation.
#[derive(Debug, Clone, Error)]
pub enum StayError {
    /// A date string did not parse as `YYYY-MM-DD`.
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Check-out was not strictly after check-in.
    #[error("check-out date must be after check-in date")]
    EmptyStay,
}

/// A validated `[check_in, check_out)` request interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    /// Build a range from already-parsed dates, enforcing a non-empty stay.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, StayError> {
        if check_out <= check_in {
            return Err(StayError::EmptyStay);
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Parse a range from wire strings.
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self, StayError> {
        let check_in = NaiveDate::parse_from_str(check_in, DATE_FORMAT)
            .map_err(|_| StayError::InvalidDate(check_in.to_string()))?;
        let check_out = NaiveDate::parse_from_str(check_out, DATE_FORMAT)
            .map_err(|_| StayError::InvalidDate(check_out.to_string()))?;
        Self::new(check_in, check_out)
    }

    /// The nights the stay occupies, checkout day excluded.
    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.check_in
            .iter_days()
            .take_while(move |d| *d < self.check_out)
    }
}

/// Whether a hotel with the given capacity can absorb one more stay over
/// `stay`, given its current reservations.
///
/// Builds a per-night occupancy histogram from the reservations that overlap
/// the request interval and compares every requested night against the
/// capacity. Cancelled reservations must not be in `reservations`.
pub fn fits_capacity(capacity: u32, reservations: &[Reservation], stay: &StayRange) -> bool {
    if capacity == 0 {
        return false;
    }

    let mut occupancy: HashMap<NaiveDate, u32> = HashMap::new();
    for reservation in reservations {
        // Overlap test: [r.check_in, r.check_out) ∩ [stay.check_in, stay.check_out) ≠ ∅
        if reservation.check_out > stay.check_in && reservation.check_in < stay.check_out {
            let from = reservation.check_in.max(stay.check_in);
            let to = reservation.check_out.min(stay.check_out);
            let mut night = from;
            while night < to {
                *occupancy.entry(night).or_insert(0) += 1;
                night = night.succ_opt().unwrap_or(to);
            }
        }
    }

    stay.nights()
        .all(|night| occupancy.get(&night).copied().unwrap_or(0) < capacity)
}
