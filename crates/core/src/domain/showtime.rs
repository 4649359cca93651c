use serde::{Deserialize, Serialize};

use crate::domain::movie::eq_ignore_case;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(pub String);

impl ShowId {
    pub fn matches(&self, candidate: &str) -> bool {
        eq_ignore_case(&self.0, candidate)
    }
}

impl std::fmt::Display for ShowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Showtime {
    pub show_id: ShowId,
    pub time: String,
    pub theatre_name: String,
    pub seats: SeatCount,
}

/// Seat inventory of one showtime. `available` never exceeds `total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSeatCount")]
pub struct SeatCount {
    pub available: u32,
    pub total: u32,
}

#[derive(Deserialize)]
struct RawSeatCount {
    available: u32,
    total: u32,
}

impl TryFrom<RawSeatCount> for SeatCount {
    type Error = String;

    fn try_from(raw: RawSeatCount) -> Result<Self, Self::Error> {
        if raw.available > raw.total {
            return Err(format!(
                "available seats ({}) exceed total seats ({})",
                raw.available, raw.total
            ));
        }
        Ok(Self { available: raw.available, total: raw.total })
    }
}

impl SeatCount {
    pub fn new(available: u32, total: u32) -> Self {
        Self { available: available.min(total), total }
    }

    /// Removes `seats` from the available pool, returning the remaining count.
    /// Leaves the count untouched when fewer than `seats` are available.
    pub fn reserve(&mut self, seats: u32) -> Result<u32, u32> {
        if self.available < seats {
            return Err(self.available);
        }
        self.available -= seats;
        Ok(self.available)
    }
}

#[cfg(test)]
mod tests {
    use super::{SeatCount, ShowId};

    #[test]
    fn reserve_decrements_available_seats() {
        let mut seats = SeatCount::new(5, 10);
        assert_eq!(seats.reserve(3), Ok(2));
        assert_eq!(seats, SeatCount::new(2, 10));
    }

    #[test]
    fn reserve_rejects_without_mutation_when_short() {
        let mut seats = SeatCount::new(2, 10);
        assert_eq!(seats.reserve(3), Err(2));
        assert_eq!(seats, SeatCount::new(2, 10));
    }

    #[test]
    fn new_clamps_available_to_total() {
        assert_eq!(SeatCount::new(12, 10).available, 10);
    }

    #[test]
    fn decoding_refuses_more_available_than_total() {
        let decoded: SeatCount =
            serde_json::from_str(r#"{"available": 40, "total": 40}"#).expect("valid seats");
        assert_eq!(decoded, SeatCount::new(40, 40));

        let error = serde_json::from_str::<SeatCount>(r#"{"available": 41, "total": 40}"#)
            .expect_err("inconsistent seats");
        assert!(error.to_string().contains("available seats (41) exceed total seats (40)"));
    }

    #[test]
    fn show_id_matching_ignores_case() {
        assert!(ShowId("S1-DEL".to_string()).matches("s1-del"));
        assert!(!ShowId("S1".to_string()).matches("S2"));
    }
}
