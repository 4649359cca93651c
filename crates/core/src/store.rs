//! Inventory store contract and the serialized handle shared by services.
//!
//! Backends only know how to read and replace the whole movie collection.
//! [`Inventory`] adds the mutual-exclusion discipline on top: reads share a
//! guard, while an update holds the exclusive guard across its load,
//! decision, and commit so competing bookings can never act on the same
//! stale seat count.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::movie::Movie;
use crate::errors::ApplicationError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("inventory i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("inventory decode failed: {0}")]
    Decode(String),
    #[error("inventory database error: {0}")]
    Database(String),
    #[error("inventory store unavailable: {0}")]
    Unavailable(String),
}

/// Decode failures become `Corrupt`; everything else is a retryable
/// persistence failure.
impl From<StoreError> for ApplicationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Decode(_) => ApplicationError::Corrupt(value.to_string()),
            _ => ApplicationError::Persistence(value.to_string()),
        }
    }
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Returns every movie in insertion order, each with its showtimes.
    async fn load_all(&self) -> Result<Vec<Movie>, StoreError>;

    /// Replaces the persisted collection wholesale.
    async fn commit(&self, movies: &[Movie]) -> Result<(), StoreError>;
}

pub struct Inventory {
    store: Arc<dyn InventoryStore>,
    guard: RwLock<()>,
}

impl Inventory {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store, guard: RwLock::new(()) }
    }

    pub fn shared(store: impl InventoryStore + 'static) -> Arc<Self> {
        Arc::new(Self::new(Arc::new(store)))
    }

    /// Reads the collection. Runs alongside other reads, never alongside an update.
    pub async fn snapshot(&self) -> Result<Vec<Movie>, StoreError> {
        let _read = self.guard.read().await;
        self.store.load_all().await
    }

    /// Runs `apply` against a fresh copy of the collection under the exclusive
    /// guard and commits the result when `apply` succeeds. A failing `apply`
    /// leaves the store untouched.
    pub async fn update<T, E, F>(&self, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut Vec<Movie>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _write = self.guard.write().await;
        let mut movies = self.store.load_all().await?;
        let value = apply(&mut movies)?;
        self.store.commit(&movies).await?;
        Ok(value)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::{movie, showtime, FixtureStore};
    use super::{Inventory, StoreError};

    #[tokio::test]
    async fn failed_update_does_not_commit() {
        let store = Arc::new(FixtureStore::with(vec![movie("M1", "Inception", "Delhi", vec![])]));
        let inventory = Inventory::new(store.clone());

        let result: Result<(), StoreError> = inventory
            .update(|movies| {
                movies.clear();
                Err(StoreError::Decode("rejected".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.commit_count(), 0);
        assert_eq!(inventory.snapshot().await.expect("snapshot").len(), 1);
    }

    #[tokio::test]
    async fn successful_update_commits_mutated_collection() {
        let store = Arc::new(FixtureStore::with(vec![movie(
            "M1",
            "Inception",
            "Delhi",
            vec![showtime("S1", 4, 10)],
        )]));
        let inventory = Inventory::new(store.clone());

        let remaining = inventory
            .update(|movies| {
                let seats = &mut movies[0].showtimes[0].seats;
                seats.reserve(3).map_err(|_| StoreError::Decode("short".to_string()))
            })
            .await
            .expect("update should succeed");

        assert_eq!(remaining, 1);
        assert_eq!(store.commit_count(), 1);
        let movies = inventory.snapshot().await.expect("snapshot");
        assert_eq!(movies[0].showtimes[0].seats.available, 1);
    }

    #[tokio::test]
    async fn load_failures_propagate() {
        let store = Arc::new(FixtureStore::default());
        store.fail_next_loads(1);
        let inventory = Inventory::new(store);

        let error = inventory.snapshot().await.expect_err("load should fail");
        assert!(error.to_string().contains("injected load failure"));
    }
}
