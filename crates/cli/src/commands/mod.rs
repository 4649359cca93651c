pub mod chat;
pub mod config;
pub mod doctor;
pub mod query;
pub mod seed;

use std::sync::Arc;

use marquee_core::config::{AppConfig, LoadOptions};
use marquee_core::store::Inventory;
use marquee_db::open_store;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) const EXIT_REJECTED: u8 = 1;
pub(crate) const EXIT_CONFIG: u8 = 2;
pub(crate) const EXIT_RUNTIME: u8 = 3;
pub(crate) const EXIT_STORE: u8 = 4;
pub(crate) const EXIT_SEED_CONFLICT: u8 = 5;

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME,
        )
    })
}

pub(crate) async fn open_inventory(
    command: &str,
    config: &AppConfig,
) -> Result<Arc<Inventory>, CommandResult> {
    let store = open_store(&config.store).await.map_err(|error| {
        CommandResult::failure(
            command,
            "store_unavailable",
            format!("failed to open inventory store: {error}"),
            EXIT_STORE,
        )
    })?;
    Ok(Arc::new(Inventory::new(store)))
}

/// Human-readable description of where the inventory lives.
pub(crate) fn store_target(config: &AppConfig) -> String {
    use marquee_core::config::StoreBackend;

    match config.store.backend {
        StoreBackend::Json => format!("json file `{}`", config.store.data_path.display()),
        StoreBackend::Sqlite => format!("sqlite `{}`", config.store.database_url),
    }
}
