//! Reservation wire type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stay booked by a user at a hotel.
///
/// `check_out` is exclusive: a reservation `[check_in, check_out)` occupies
/// the nights `check_in .. check_out - 1`, so a new stay whose check-in
/// equals an existing check-out does not conflict. `hotel_name` is a
/// denormalized copy taken from the hotel record at booking time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub hotel_id: Uuid,
    #[serde(default)]
    pub hotel_name: String,
    pub user_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Reservation {
    /// Number of nights the stay occupies. Zero when the dates are inverted,
    /// which validation upstream rejects anyway.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(0)
    }

    /// Whether the reservation occupies the given night.
    pub fn occupies(&self, night: NaiveDate) -> bool {
        self.check_in <= night && night < self.check_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn reservation(check_in: &str, check_out: &str) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            hotel_id: Uuid::new_v4(),
            hotel_name: "Grand Plaza".to_string(),
            user_id: "7".to_string(),
            check_in: date(check_in),
            check_out: date(check_out),
        }
    }

    #[test]
    fn occupies_checkin_night_but_not_checkout_day() {
        let r = reservation("2024-01-01", "2024-01-02");
        assert!(r.occupies(date("2024-01-01")));
        assert!(!r.occupies(date("2024-01-02")));
    }

    #[test]
    fn nights_counts_exclusive_checkout() {
        assert_eq!(reservation("2025-10-20", "2025-10-21").nights(), 1);
        assert_eq!(reservation("2025-10-20", "2025-10-25").nights(), 5);
    }

    #[test]
    fn dates_serialize_as_calendar_days() {
        let r = reservation("2024-03-09", "2024-03-11");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["check_in"], "2024-03-09");
        assert_eq!(json["check_out"], "2024-03-11");
    }
}
