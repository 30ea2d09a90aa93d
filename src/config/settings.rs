//! Environment configuration settings
//!
//! Values read from the process environment (and `.env`), layered over the JSON file

use super::file::AppConfig;
use crate::models::ActionKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Settings taken from the environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Provider base URL override
    pub base_url: Option<String>,
    /// Request timeout override in seconds
    pub timeout: Option<u64>,
    /// Data directory override for the JSON stores
    pub data_dir: Option<PathBuf>,
    /// Retry cap override
    pub max_retries: Option<u32>,
    /// Credential pools from `CONSULTANT_<ACTION>_KEYS`
    pub api_keys: BTreeMap<ActionKind, Vec<String>>,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Settings {
    /// Create a new configuration instance
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let mut api_keys = BTreeMap::new();
        for action in ActionKind::ALL {
            let var = key_var(action);
            let keys = optional_env(&var).map(|raw| split_keys(&raw)).unwrap_or_default();
            if keys.is_empty() {
                continue;
            }
            debug!("{} credentials for '{}' from {}", keys.len(), action, var);
            api_keys.insert(action, keys);
        }

        let settings = Self {
            base_url: optional_env("CONSULTANT_BASE_URL"),
            timeout: optional_env("CONSULTANT_TIMEOUT")
                .map(|v| v.parse())
                .transpose()
                .context("Invalid timeout value")?,
            data_dir: optional_env("CONSULTANT_DATA_DIR").map(PathBuf::from),
            max_retries: optional_env("CONSULTANT_MAX_RETRIES")
                .map(|v| v.parse())
                .transpose()
                .context("Invalid maximum retries value")?,
            api_keys,
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        // Validate configuration
        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http") {
                anyhow::bail!("Invalid base URL format, should start with 'http'");
            }
        }

        if self.timeout == Some(0) {
            anyhow::bail!("Timeout values cannot be 0");
        }

        // Validate log format
        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Overlay environment values onto the file configuration.
    /// Environment credentials replace the file pool for the same action;
    /// an empty environment pool leaves the file pool in place.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(base_url) = &self.base_url {
            config.provider.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.provider.timeout = timeout;
        }
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if let Some(max_retries) = self.max_retries {
            config.retry.max_retries = max_retries;
        }
        for (action, keys) in self.api_keys.iter().filter(|(_, keys)| !keys.is_empty()) {
            config.api_keys.insert(*action, keys.clone());
        }
    }
}

/// Environment variable holding the credential pool for an action
pub fn key_var(action: ActionKind) -> String {
    format!("CONSULTANT_{}_KEYS", action.as_str().to_uppercase())
}

/// Split a comma separated credential list, dropping blanks
pub fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Non-empty environment variable
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keys() {
        assert_eq!(split_keys("k1, k2,,k3 "), vec!["k1", "k2", "k3"]);
        assert!(split_keys(" , ").is_empty());
    }

    #[test]
    fn test_key_var() {
        assert_eq!(key_var(ActionKind::Fetch), "CONSULTANT_FETCH_KEYS");
        assert_eq!(key_var(ActionKind::Evaluate), "CONSULTANT_EVALUATE_KEYS");
    }

    #[test]
    fn test_apply_to_overrides_file_values() {
        let mut config = AppConfig::default();
        config.api_keys.insert(ActionKind::Fetch, vec!["file-key".to_string()]);
        config.api_keys.insert(ActionKind::Refine, vec!["file-refine".to_string()]);

        let mut settings = Settings::default();
        settings.base_url = Some("http://localhost:9999/v1".to_string());
        settings.max_retries = Some(2);
        settings.api_keys.insert(ActionKind::Fetch, vec!["env-1".to_string(), "env-2".to_string()]);

        settings.apply_to(&mut config);

        assert_eq!(config.provider.base_url, "http://localhost:9999/v1");
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.keys_for(ActionKind::Fetch), &["env-1".to_string(), "env-2".to_string()]);
        assert_eq!(config.keys_for(ActionKind::Refine), &["file-refine".to_string()]);
    }

    #[test]
    fn test_apply_to_keeps_file_keys_for_empty_pool() {
        let mut config = AppConfig::default();
        config.api_keys.insert(ActionKind::Fetch, vec!["file-key".to_string()]);

        let mut settings = Settings::default();
        settings.api_keys.insert(ActionKind::Fetch, Vec::new());

        settings.apply_to(&mut config);

        assert_eq!(config.keys_for(ActionKind::Fetch), &["file-key".to_string()]);
    }
}
