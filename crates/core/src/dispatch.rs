//! Dispatch of typed requests to the catalog and booking services with a
//! bounded, fixed-delay retry policy.
//!
//! Only operational failures (store or transport) are retried. Domain
//! outcomes such as "show not found" come back as successful results and
//! are returned on the first attempt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::booking::{BookingOutcome, BookingService};
use crate::catalog::{
    CatalogService, MovieListing, ShowtimeListing, ShowtimeLookup, SHOWTIMES_NOT_FOUND,
};
use crate::domain::intent::IntentRequest;
use crate::domain::showtime::ShowId;
use crate::errors::ApplicationError;
use crate::store::Inventory;

pub const FAILED_AFTER_RETRIES: &str = "failed after retries";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(2) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryFailure {
    pub attempts: u32,
    pub last_error: ApplicationError,
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or
/// the attempt budget is spent. The closure receives the 1-based attempt number.
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryFailure>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ApplicationError>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %error, "attempt failed; retrying");
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
            Err(error) => {
                warn!(attempt, max_attempts, error = %error, "giving up");
                return Err(RetryFailure { attempts: attempt, last_error: error });
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub success: bool,
    pub message: String,
    pub show_id: ShowId,
    pub seats: u32,
    pub remaining: u32,
}

/// Plain result handed back to renderers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DispatchResult {
    Movies(MovieListing),
    Showtimes(ShowtimeListing),
    Booked(BookingReceipt),
    Rejected { error: String },
    Failed { error: String, attempts: u32, last_error: String },
}

impl DispatchResult {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected { error: message.into() }
    }

}

impl From<BookingOutcome> for DispatchResult {
    fn from(value: BookingOutcome) -> Self {
        match value {
            BookingOutcome::Confirmed(confirmation) => Self::Booked(BookingReceipt {
                success: true,
                message: confirmation.message,
                show_id: confirmation.show_id,
                seats: confirmation.seats,
                remaining: confirmation.remaining,
            }),
            BookingOutcome::Rejected(rejection) => Self::rejected(rejection.message()),
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    catalog: CatalogService,
    booking: BookingService,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(inventory: Arc<Inventory>, policy: RetryPolicy) -> Self {
        Self {
            catalog: CatalogService::new(inventory.clone()),
            booking: BookingService::new(inventory),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn invoke(&self, request: &IntentRequest) -> DispatchResult {
        let correlation_id = Uuid::new_v4().to_string();
        let intent = request.kind();
        info!(
            event_name = "dispatch.invoke",
            correlation_id = %correlation_id,
            intent = %intent,
            "dispatching request"
        );

        let outcome = retry_transient(&self.policy, |attempt| {
            let correlation_id = correlation_id.as_str();
            async move {
                tracing::debug!(correlation_id, attempt, intent = %intent, "dispatch attempt");
                self.execute(request).await
            }
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(RetryFailure { attempts, last_error }) => {
                warn!(
                    event_name = "dispatch.failed",
                    correlation_id = %correlation_id,
                    intent = %intent,
                    attempts,
                    error = %last_error,
                    "dispatch failed"
                );
                match last_error {
                    ApplicationError::Domain(error) => DispatchResult::rejected(error.to_string()),
                    error if error.is_transient() => DispatchResult::Failed {
                        error: FAILED_AFTER_RETRIES.to_string(),
                        attempts,
                        last_error: error.to_string(),
                    },
                    error => DispatchResult::Failed {
                        error: "operation failed".to_string(),
                        attempts,
                        last_error: error.to_string(),
                    },
                }
            }
        }
    }

    async fn execute(&self, request: &IntentRequest) -> Result<DispatchResult, ApplicationError> {
        match request {
            IntentRequest::ListMovies { location } => {
                self.catalog.list_movies(location).await.map(DispatchResult::Movies)
            }
            IntentRequest::GetShowtimes { movie_name, location } => {
                match self.catalog.get_showtimes(movie_name, location).await? {
                    ShowtimeLookup::Found(listing) => Ok(DispatchResult::Showtimes(listing)),
                    ShowtimeLookup::NotFound => Ok(DispatchResult::rejected(SHOWTIMES_NOT_FOUND)),
                }
            }
            IntentRequest::BookTicket(booking) => {
                self.booking.book(booking).await.map(DispatchResult::from)
            }
        }
    }
}
