use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::intent::BookingRequest;
use crate::domain::showtime::ShowId;
use crate::errors::ApplicationError;
use crate::store::{Inventory, StoreError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub show_id: ShowId,
    pub seats: u32,
    pub remaining: u32,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingRejection {
    SeatsMustBePositive,
    ShowNotFound,
    InsufficientSeats { available: u32 },
}

impl BookingRejection {
    pub fn message(&self) -> String {
        match self {
            Self::SeatsMustBePositive => "seats must be positive".to_string(),
            Self::ShowNotFound => "show not found".to_string(),
            Self::InsufficientSeats { available } => format!("only {available} seats available"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingOutcome {
    Confirmed(BookingConfirmation),
    Rejected(BookingRejection),
}

enum Abort {
    Rejected(BookingRejection),
    Store(StoreError),
}

impl From<StoreError> for Abort {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Clone)]
pub struct BookingService {
    inventory: Arc<Inventory>,
}

impl BookingService {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self { inventory }
    }

    /// Reserves seats for a showtime. Lookup, availability check, and
    /// decrement run as one exclusive inventory update; rejections leave the
    /// store untouched.
    pub async fn book(&self, request: &BookingRequest) -> Result<BookingOutcome, ApplicationError> {
        if request.seats <= 0 {
            return Ok(BookingOutcome::Rejected(BookingRejection::SeatsMustBePositive));
        }
        // Counts past u32::MAX can never be satisfied.
        let seats = u32::try_from(request.seats).unwrap_or(u32::MAX);

        let result = self
            .inventory
            .update(|movies| -> Result<u32, Abort> {
                let showtime = movies
                    .iter_mut()
                    .flat_map(|movie| movie.showtimes.iter_mut())
                    .find(|showtime| showtime.show_id.matches(&request.show_id.0))
                    .ok_or(Abort::Rejected(BookingRejection::ShowNotFound))?;

                let remaining = showtime.seats.reserve(seats).map_err(|available| {
                    Abort::Rejected(BookingRejection::InsufficientSeats { available })
                })?;
                Ok(remaining)
            })
            .await;

        match result {
            Ok(remaining) => {
                info!(
                    event_name = "booking.confirmed",
                    show_id = %request.show_id,
                    seats,
                    remaining,
                    user_id = request.user_id.as_deref().unwrap_or("anonymous"),
                    "seats booked"
                );
                Ok(BookingOutcome::Confirmed(BookingConfirmation {
                    show_id: request.show_id.clone(),
                    seats,
                    remaining,
                    message: format!("{seats} seats booked for show {}", request.show_id),
                }))
            }
            Err(Abort::Rejected(rejection)) => {
                info!(
                    event_name = "booking.rejected",
                    show_id = %request.show_id,
                    seats,
                    reason = %rejection.message(),
                    "booking rejected"
                );
                Ok(BookingOutcome::Rejected(rejection))
            }
            Err(Abort::Store(error)) => Err(error.into()),
        }
    }
}
