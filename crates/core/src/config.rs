use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::RetryPolicy;

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["marquee.toml", "config/marquee.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub dispatch: DispatchConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_path: PathBuf,
    pub database_url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Json,
    Sqlite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    DeepSeek,
    OpenAi,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub store_backend: Option<StoreBackend>,
    pub data_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Json,
                data_path: PathBuf::from("movies_data/data.json"),
                database_url: "sqlite://marquee.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::DeepSeek,
                api_key: None,
                base_url: LlmProvider::DeepSeek.default_base_url().to_string(),
                model: "deepseek-chat".to_string(),
                timeout_secs: 60,
                temperature: 0.0,
            },
            dispatch: DispatchConfig { max_attempts: 3, retry_delay_ms: 2_000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Validation(format!(
                "unsupported store backend `{other}` (expected json|sqlite)"
            ))),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deepseek" | "deep_seek" => Ok(Self::DeepSeek),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected deepseek|openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ConfigError> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(tracing::Level::TRACE),
            "debug" => Ok(tracing::Level::DEBUG),
            "info" => Ok(tracing::Level::INFO),
            "warn" => Ok(tracing::Level::WARN),
            "error" => Ok(tracing::Level::ERROR),
            other => Err(ConfigError::Validation(format!(
                "logging.level `{other}` must be one of trace|debug|info|warn|error"
            ))),
        }
    }
}

impl DispatchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

impl LlmConfig {
    /// The API key, required only by providers that authenticate.
    pub fn require_api_key(&self) -> Result<Option<&str>, ConfigError> {
        let key = self
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim())
            .filter(|value| !value.is_empty());

        match key {
            None if self.provider.requires_api_key() => Err(ConfigError::Validation(
                "llm.api_key is required for deepseek/openai providers (set MARQUEE_LLM_API_KEY or DEEPSEEK_API_KEY)"
                    .to_string(),
            )),
            key => Ok(key),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(store) = patch.store {
            if let Some(backend) = store.backend {
                self.store.backend = backend;
            }
            if let Some(data_path) = store.data_path {
                self.store.data_path = data_path;
            }
            if let Some(database_url) = store.database_url {
                self.store.database_url = database_url;
            }
            if let Some(max_connections) = store.max_connections {
                self.store.max_connections = max_connections;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.set_provider(provider);
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
        }

        if let Some(dispatch) = patch.dispatch {
            if let Some(max_attempts) = dispatch.max_attempts {
                self.dispatch.max_attempts = max_attempts;
            }
            if let Some(retry_delay_ms) = dispatch.retry_delay_ms {
                self.dispatch.retry_delay_ms = retry_delay_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MARQUEE_STORE_BACKEND") {
            self.store.backend = value.parse()?;
        }
        if let Some(value) = read_env("MARQUEE_STORE_DATA_PATH") {
            self.store.data_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("MARQUEE_STORE_DATABASE_URL") {
            self.store.database_url = value;
        }
        if let Some(value) = read_env("MARQUEE_STORE_MAX_CONNECTIONS") {
            self.store.max_connections = parse_u32("MARQUEE_STORE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("MARQUEE_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_u64("MARQUEE_STORE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MARQUEE_LLM_PROVIDER") {
            self.set_provider(value.parse()?);
        }
        let api_key = read_env("MARQUEE_LLM_API_KEY").or_else(|| read_env("DEEPSEEK_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        let base_url = read_env("MARQUEE_LLM_BASE_URL").or_else(|| read_env("DEEPSEEK_API_BASE"));
        if let Some(value) = base_url {
            self.llm.base_url = value;
        }
        let model = read_env("MARQUEE_LLM_MODEL").or_else(|| read_env("DEEPSEEK_MODEL"));
        if let Some(value) = model {
            self.llm.model = value;
        }
        if let Some(value) = read_env("MARQUEE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("MARQUEE_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("MARQUEE_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("MARQUEE_LLM_TEMPERATURE", &value)?;
        }

        if let Some(value) = read_env("MARQUEE_DISPATCH_MAX_ATTEMPTS") {
            self.dispatch.max_attempts = parse_u32("MARQUEE_DISPATCH_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("MARQUEE_DISPATCH_RETRY_DELAY_MS") {
            self.dispatch.retry_delay_ms = parse_u64("MARQUEE_DISPATCH_RETRY_DELAY_MS", &value)?;
        }

        let log_level = read_env("MARQUEE_LOGGING_LEVEL").or_else(|| read_env("MARQUEE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MARQUEE_LOGGING_FORMAT").or_else(|| read_env("MARQUEE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(backend) = overrides.store_backend {
            self.store.backend = backend;
        }
        if let Some(data_path) = overrides.data_path {
            self.store.data_path = data_path;
        }
        if let Some(database_url) = overrides.database_url {
            self.store.database_url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.set_provider(llm_provider);
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(max_attempts) = overrides.max_attempts {
            self.dispatch.max_attempts = max_attempts;
        }
        if let Some(retry_delay_ms) = overrides.retry_delay_ms {
            self.dispatch.retry_delay_ms = retry_delay_ms;
        }
    }

    /// Switching provider also moves the base URL when it still points at the
    /// previous provider's default endpoint.
    fn set_provider(&mut self, provider: LlmProvider) {
        if self.llm.base_url == self.llm.provider.default_base_url() {
            self.llm.base_url = provider.default_base_url().to_string();
        }
        self.llm.provider = provider;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        validate_llm(&self.llm)?;
        validate_dispatch(&self.dispatch)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    match store.backend {
        StoreBackend::Json => {
            if store.data_path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "store.data_path must not be empty for the json backend".to_string(),
                ));
            }
        }
        StoreBackend::Sqlite => {
            let url = store.database_url.trim();
            let sqlite_url =
                url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
            if !sqlite_url {
                return Err(ConfigError::Validation(
                    "store.database_url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                        .to_string(),
                ));
            }
        }
    }

    if store.max_connections == 0 {
        return Err(ConfigError::Validation(
            "store.max_connections must be greater than zero".to_string(),
        ));
    }

    if store.timeout_secs == 0 || store.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "store.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    let base_url = llm.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_dispatch(dispatch: &DispatchConfig) -> Result<(), ConfigError> {
    if dispatch.max_attempts == 0 || dispatch.max_attempts > 10 {
        return Err(ConfigError::Validation(
            "dispatch.max_attempts must be in range 1..=10".to_string(),
        ));
    }

    if dispatch.retry_delay_ms > 60_000 {
        return Err(ConfigError::Validation(
            "dispatch.retry_delay_ms must not exceed 60000".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    logging.max_level().map(|_| ())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    llm: Option<LlmPatch>,
    dispatch: Option<DispatchPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    backend: Option<StoreBackend>,
    data_path: Option<PathBuf>,
    database_url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct DispatchPatch {
    max_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat, StoreBackend,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: &[&str] = &[
        "MARQUEE_STORE_BACKEND",
        "MARQUEE_STORE_DATA_PATH",
        "MARQUEE_STORE_DATABASE_URL",
        "MARQUEE_LLM_PROVIDER",
        "MARQUEE_LLM_API_KEY",
        "MARQUEE_LLM_BASE_URL",
        "MARQUEE_LLM_MODEL",
        "MARQUEE_DISPATCH_MAX_ATTEMPTS",
        "MARQUEE_DISPATCH_RETRY_DELAY_MS",
        "MARQUEE_LOGGING_LEVEL",
        "MARQUEE_LOGGING_FORMAT",
        "MARQUEE_LOG_LEVEL",
        "MARQUEE_LOG_FORMAT",
        "DEEPSEEK_API_KEY",
        "DEEPSEEK_MODEL",
        "DEEPSEEK_API_BASE",
        "TEST_MARQUEE_DATA_DIR",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in MANAGED_VARS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_original_assistant_settings() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let config = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("does-not-exist.toml")),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.store.backend == StoreBackend::Json, "json backend is the default")?;
        ensure(config.llm.provider == LlmProvider::DeepSeek, "deepseek is the default provider")?;
        ensure(config.llm.model == "deepseek-chat", "deepseek-chat is the default model")?;
        ensure(
            config.dispatch.retry_policy().max_attempts == 3
                && config.dispatch.retry_policy().delay == Duration::from_secs(2),
            "dispatch retries three times with a two second delay",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("TEST_MARQUEE_DATA_DIR", "/srv/marquee");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("marquee.toml");
            fs::write(
                &path,
                r#"
[store]
data_path = "${TEST_MARQUEE_DATA_DIR}/data.json"

[dispatch]
max_attempts = 5
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.store.data_path == PathBuf::from("/srv/marquee/data.json"),
                "data path should be interpolated from environment",
            )?;
            ensure(config.dispatch.max_attempts == 5, "file should set max attempts")
        })();

        clear_vars();
        result
    }

    #[test]
    fn original_deepseek_variables_are_accepted() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("DEEPSEEK_API_KEY", "sk-from-env");
        env::set_var("DEEPSEEK_MODEL", "deepseek-reasoner");
        env::set_var("DEEPSEEK_API_BASE", "https://proxy.example.com/v1");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.llm.api_key.as_ref().map(|key| key.expose_secret()) == Some("sk-from-env"),
                "api key should come from DEEPSEEK_API_KEY",
            )?;
            ensure(config.llm.model == "deepseek-reasoner", "model should come from DEEPSEEK_MODEL")?;
            ensure(
                config.llm.base_url == "https://proxy.example.com/v1",
                "base url should come from DEEPSEEK_API_BASE",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("MARQUEE_STORE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("MARQUEE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("marquee.toml");
            fs::write(
                &path,
                r#"
[store]
backend = "sqlite"
database_url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.store.backend == StoreBackend::Sqlite, "file should select sqlite")?;
            ensure(
                config.store.database_url == "sqlite://from-env.db",
                "env database url should win over file",
            )?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(matches!(config.logging.format, LogFormat::Pretty), "env log format applies")
        })();

        clear_vars();
        result
    }

    #[test]
    fn switching_provider_moves_default_base_url() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("MARQUEE_LLM_PROVIDER", "ollama");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.base_url == "http://localhost:11434/v1", "ollama endpoint applies")?;
            ensure(
                matches!(config.llm.require_api_key(), Ok(None)),
                "ollama does not need an api key",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn api_key_is_required_lazily_for_hosted_providers() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load should not need an api key: {err}"))?;
        let has_message = matches!(
            config.llm.require_api_key(),
            Err(ConfigError::Validation(ref message)) if message.contains("llm.api_key")
        );
        ensure(has_message, "missing key should be reported when the llm is needed")
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("MARQUEE_DISPATCH_MAX_ATTEMPTS", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("dispatch.max_attempts")
            );
            ensure(has_message, "validation failure should mention dispatch.max_attempts")
        })();

        clear_vars();
        result
    }

    #[test]
    fn unknown_log_level_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("MARQUEE_LOGGING_LEVEL", "loud");

        let result = (|| -> Result<(), String> {
            let rejected = matches!(
                AppConfig::load(LoadOptions::default()),
                Err(ConfigError::Validation(ref message)) if message.contains("logging.level `loud`")
            );
            ensure(rejected, "unknown log level should fail validation")?;

            env::set_var("MARQUEE_LOGGING_LEVEL", " WARN ");
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.logging.max_level().ok() == Some(tracing::Level::WARN),
                "log level parsing ignores case and padding",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();
        env::set_var("MARQUEE_LLM_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")
        })();

        clear_vars();
        result
    }
}
