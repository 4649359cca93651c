//! `InventoryStore` backends.

use std::sync::Arc;

use marquee_core::config::{StoreBackend, StoreConfig};
use marquee_core::store::{InventoryStore, StoreError};

use crate::connection::connect_with_settings;
use crate::migrations::run_pending;

pub mod json_file;
pub mod memory;
pub mod sql;

pub use json_file::JsonFileInventoryStore;
pub use memory::InMemoryInventoryStore;
pub use sql::SqlInventoryStore;

/// Opens the backend selected by `config`, running migrations for SQLite.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn InventoryStore>, StoreError> {
    match config.backend {
        StoreBackend::Json => Ok(Arc::new(JsonFileInventoryStore::new(&config.data_path))),
        StoreBackend::Sqlite => {
            let pool = connect_with_settings(
                &config.database_url,
                config.max_connections,
                config.timeout_secs,
            )
            .await
            .map_err(sql::database_error)?;
            run_pending(&pool)
                .await
                .map_err(|error| StoreError::Database(format!("migration failed: {error}")))?;
            Ok(Arc::new(SqlInventoryStore::new(pool)))
        }
    }
}
