use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use marquee_core::domain::movie::Movie;
use marquee_core::store::{InventoryStore, StoreError};

/// Process-local inventory. Load failures can be injected to exercise the
/// dispatch retrier.
#[derive(Default)]
pub struct InMemoryInventoryStore {
    movies: RwLock<Vec<Movie>>,
    failing_loads: AtomicU32,
    commits: AtomicU32,
}

impl InMemoryInventoryStore {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self { movies: RwLock::new(movies), ..Self::default() }
    }

    /// Makes the next `count` calls to `load_all` fail with `StoreError::Unavailable`.
    pub fn fail_next_loads(&self, count: u32) {
        self.failing_loads.store(count, Ordering::SeqCst);
    }

    pub fn commit_count(&self) -> u32 {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn load_all(&self) -> Result<Vec<Movie>, StoreError> {
        let injected = self
            .failing_loads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Unavailable("injected load failure".to_string()));
        }

        Ok(self.movies.read().await.clone())
    }

    async fn commit(&self, movies: &[Movie]) -> Result<(), StoreError> {
        *self.movies.write().await = movies.to_vec();
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use marquee_core::store::{InventoryStore, StoreError};

    use super::InMemoryInventoryStore;
    use crate::fixtures::DemoDataset;

    #[tokio::test]
    async fn injected_failures_are_consumed_one_per_load() {
        let store = InMemoryInventoryStore::new(DemoDataset::movies());
        store.fail_next_loads(2);

        assert!(matches!(store.load_all().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.load_all().await, Err(StoreError::Unavailable(_))));
        assert_eq!(store.load_all().await.expect("third load").len(), DemoDataset::movies().len());
    }

    #[tokio::test]
    async fn commit_replaces_collection() {
        let store = InMemoryInventoryStore::default();
        store.commit(&DemoDataset::movies()).await.expect("commit");

        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.load_all().await.expect("load"), DemoDataset::movies());
    }
}
