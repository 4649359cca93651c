//! Storage backends for the movie inventory.

pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, DbPool};
pub use fixtures::{DemoDataset, SeedError, SeedResult};
pub use repositories::{
    open_store, InMemoryInventoryStore, JsonFileInventoryStore, SqlInventoryStore,
};
