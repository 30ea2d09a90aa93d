//! File-based configuration loading
//!
//! Loads credentials, model ceilings, retry policy and storage paths from a JSON file

use crate::models::{ActionKind, ModelCatalog, ModelName};
use crate::services::RetryConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Upstream provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Base URL of the OpenAI-compatible API (default: Groq)
    #[serde(rename = "baseUrl", default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

/// Rate-limit retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(rename = "maxRetries", default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(rename = "maxElapsedSecs", default = "default_max_elapsed_secs")]
    pub max_elapsed_secs: u64,

    #[serde(rename = "initialBackoffMs", default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(rename = "maxBackoffMs", default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    8
}

fn default_max_elapsed_secs() -> u64 {
    600
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    64_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_elapsed_secs: default_max_elapsed_secs(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            max_elapsed: Duration::from_secs(self.max_elapsed_secs),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Where the flat JSON stores live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(rename = "dataDir", default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageSettings {
    pub fn personas_path(&self) -> PathBuf {
        self.data_dir.join("agents.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("chat_history.json")
    }

    pub fn usage_path(&self) -> PathBuf {
        self.data_dir.join("api_usage.json")
    }
}

/// Application configuration loaded from JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider configuration (optional, defaults to Groq)
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Ordered credential pool per action
    #[serde(rename = "apiKeys", default)]
    pub api_keys: BTreeMap<ActionKind, Vec<String>>,

    /// Token ceiling overrides per model name
    #[serde(default)]
    pub models: BTreeMap<String, u32>,

    /// Ceiling for models missing from the table
    #[serde(rename = "defaultMaxTokens", skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Model used when the caller does not pick one
    #[serde(rename = "defaultModel", skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl AppConfig {
    /// Load configuration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| "Failed to parse config JSON")?;

        config.validate()?;

        debug!("Loaded credential pools for {} actions", config.api_keys.len());
        Ok(config)
    }

    /// Load configuration from default locations
    /// Searches in order:
    /// 1. ~/.config/consultant/consultant.json
    /// 2. ./consultant.json
    ///
    /// Falls back to built-in defaults when neither exists; credentials can then
    /// still come from the environment.
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::default_path() {
            return Self::load(&path);
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// First existing configuration file, if any
    pub fn default_path() -> Option<PathBuf> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("consultant").join("consultant.json");
            if config_path.exists() {
                return Some(config_path);
            }
        }

        let local_path = PathBuf::from("consultant.json");
        local_path.exists().then_some(local_path)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.provider.base_url.starts_with("http") {
            anyhow::bail!("Invalid provider base URL: {}", self.provider.base_url);
        }

        if self.provider.timeout == 0 {
            anyhow::bail!("Provider timeout cannot be 0");
        }

        for (action, keys) in &self.api_keys {
            if keys.iter().any(|key| key.trim().is_empty() || key.contains(char::is_whitespace)) {
                anyhow::bail!("Credential pool '{}' contains an empty or malformed key", action);
            }
        }

        if self.retry.initial_backoff_ms == 0 {
            anyhow::bail!("Initial backoff cannot be 0");
        }

        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            anyhow::bail!("Maximum backoff must be at least the initial backoff");
        }

        if self.default_max_tokens == Some(0) {
            anyhow::bail!("Default max tokens cannot be 0");
        }

        Ok(())
    }

    /// Model ceiling table with configured overrides applied
    pub fn catalog(&self) -> ModelCatalog {
        ModelCatalog::with_overrides(self.models.clone(), self.default_max_tokens)
    }

    pub fn default_model(&self) -> ModelName {
        self.default_model
            .as_deref()
            .map(|name| ModelName::from(name.to_string()))
            .unwrap_or_default()
    }

    /// Credentials configured for an action, possibly empty
    pub fn keys_for(&self, action: ActionKind) -> &[String] {
        self.api_keys.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }
}
