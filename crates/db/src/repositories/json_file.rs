use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use marquee_core::domain::movie::Movie;
use marquee_core::store::{InventoryStore, StoreError};
use tracing::debug;

/// Inventory kept as one pretty-printed JSON array of movies.
///
/// A missing file reads as an empty collection. Commits write a sibling
/// temporary file and rename it over the target, so a reader sees either the
/// old document or the new one.
#[derive(Clone, Debug)]
pub struct JsonFileInventoryStore {
    path: PathBuf,
}

impl JsonFileInventoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl InventoryStore for JsonFileInventoryStore {
    async fn load_all(&self) -> Result<Vec<Movie>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        serde_json::from_slice(&bytes).map_err(|error| {
            StoreError::Decode(format!("{}: {error}", self.path.display()))
        })
    }

    async fn commit(&self, movies: &[Movie]) -> Result<(), StoreError> {
        let mut document = serde_json::to_vec_pretty(movies)
            .map_err(|error| StoreError::Decode(error.to_string()))?;
        document.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staging = self.staging_path();
        tokio::fs::write(&staging, &document).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        debug!(
            event_name = "store.json.committed",
            path = %self.path.display(),
            movies = movies.len(),
            "inventory document written"
        );
        Ok(())
    }
}
