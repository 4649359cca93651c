//! Domain model and services for the movie booking assistant.
//!
//! Everything here is transport-agnostic: the CLI and the agent runtime build
//! an [`Inventory`] over some [`InventoryStore`] and hand it to a
//! [`Dispatcher`].

pub mod booking;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod store;
pub mod validation;

pub use booking::{BookingConfirmation, BookingOutcome, BookingRejection, BookingService};
pub use catalog::{CatalogService, MovieListing, ShowtimeListing, ShowtimeLookup};
pub use dispatch::{
    retry_transient, BookingReceipt, DispatchResult, Dispatcher, RetryFailure, RetryPolicy,
    FAILED_AFTER_RETRIES,
};
pub use domain::intent::{
    BookingRequest, ExtractedIntent, IntentKind, IntentRequest, ParameterMap,
};
pub use domain::movie::{Movie, MovieId, MovieSummary};
pub use domain::showtime::{SeatCount, ShowId, Showtime};
pub use errors::{ApplicationError, DomainError};
pub use store::{Inventory, InventoryStore, StoreError};
pub use validation::{coerce_seats, find_missing, required_fields};
