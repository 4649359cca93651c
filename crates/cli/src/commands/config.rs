use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use marquee_core::config::{AppConfig, LoadOptions, CONFIG_FILE_CANDIDATES};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "store.backend",
        &format!("{:?}", config.store.backend),
        source("store.backend", &["MARQUEE_STORE_BACKEND"]),
    ));
    lines.push(render_line(
        "store.data_path",
        &config.store.data_path.display().to_string(),
        source("store.data_path", &["MARQUEE_STORE_DATA_PATH"]),
    ));
    lines.push(render_line(
        "store.database_url",
        &config.store.database_url,
        source("store.database_url", &["MARQUEE_STORE_DATABASE_URL"]),
    ));
    lines.push(render_line(
        "store.max_connections",
        &config.store.max_connections.to_string(),
        source("store.max_connections", &["MARQUEE_STORE_MAX_CONNECTIONS"]),
    ));
    lines.push(render_line(
        "store.timeout_secs",
        &config.store.timeout_secs.to_string(),
        source("store.timeout_secs", &["MARQUEE_STORE_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "llm.provider",
        &format!("{:?}", config.llm.provider),
        source("llm.provider", &["MARQUEE_LLM_PROVIDER"]),
    ));
    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        source("llm.model", &["MARQUEE_LLM_MODEL", "DEEPSEEK_MODEL"]),
    ));
    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        source("llm.base_url", &["MARQUEE_LLM_BASE_URL", "DEEPSEEK_API_BASE"]),
    ));
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "llm.api_key",
        &api_key,
        source("llm.api_key", &["MARQUEE_LLM_API_KEY", "DEEPSEEK_API_KEY"]),
    ));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        source("llm.timeout_secs", &["MARQUEE_LLM_TIMEOUT_SECS"]),
    ));
    lines.push(render_line(
        "llm.temperature",
        &config.llm.temperature.to_string(),
        source("llm.temperature", &["MARQUEE_LLM_TEMPERATURE"]),
    ));

    lines.push(render_line(
        "dispatch.max_attempts",
        &config.dispatch.max_attempts.to_string(),
        source("dispatch.max_attempts", &["MARQUEE_DISPATCH_MAX_ATTEMPTS"]),
    ));
    lines.push(render_line(
        "dispatch.retry_delay_ms",
        &config.dispatch.retry_delay_ms.to_string(),
        source("dispatch.retry_delay_ms", &["MARQUEE_DISPATCH_RETRY_DELAY_MS"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["MARQUEE_LOGGING_LEVEL", "MARQUEE_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["MARQUEE_LOGGING_FORMAT", "MARQUEE_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).find(|candidate| candidate.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a provider prefix such as `sk-` and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_token};

    #[test]
    fn redaction_keeps_only_the_prefix() {
        assert_eq!(redact_token("sk-live-abcdef"), "sk-***");
        assert_eq!(redact_token("plainsecret"), "<redacted>");
        assert_eq!(redact_token("   "), "<empty>");
    }

    #[test]
    fn dotted_paths_resolve_through_tables() {
        let doc: Value = "[store]\nbackend = \"sqlite\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "store.backend"));
        assert!(!contains_path(&doc, "store.data_path"));
        assert!(!contains_path(&doc, "llm.model"));
    }
}
