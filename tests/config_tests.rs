//! Configuration module tests

use consultant::config::settings::{key_var, split_keys};
use consultant::config::{AppConfig, Settings};
use consultant::models::{ActionKind, ModelName};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

const ENV_VARS: [&str; 8] = [
    "CONSULTANT_BASE_URL",
    "CONSULTANT_TIMEOUT",
    "CONSULTANT_DATA_DIR",
    "CONSULTANT_MAX_RETRIES",
    "CONSULTANT_FETCH_KEYS",
    "CONSULTANT_REFINE_KEYS",
    "CONSULTANT_EVALUATE_KEYS",
    "LOG_FORMAT",
];

fn cleanup_test_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config_file() {
    let file = write_config(
        r#"{
            "provider": {"baseUrl": "https://api.groq.com/openai/v1", "timeout": 20},
            "apiKeys": {
                "fetch": ["gsk_a", "gsk_b"],
                "evaluate": ["gsk_c"]
            },
            "models": {"llama3-8b-8192": 2048},
            "defaultMaxTokens": 1024,
            "defaultModel": "llama3-70b-8192",
            "retry": {"maxRetries": 3, "maxElapsedSecs": 120},
            "storage": {"dataDir": "/var/lib/consultant"}
        }"#,
    );

    let config = AppConfig::load(file.path()).unwrap();

    assert_eq!(config.provider.timeout, 20);
    assert_eq!(config.keys_for(ActionKind::Fetch), ["gsk_a", "gsk_b"]);
    assert!(config.keys_for(ActionKind::Refine).is_empty());
    assert_eq!(config.default_model(), ModelName::Llama3_70b);

    let catalog = config.catalog();
    assert_eq!(catalog.max_tokens("llama3-8b-8192"), 2048);
    assert_eq!(catalog.max_tokens("mixtral-8x7b-32768"), 32768);
    assert_eq!(catalog.max_tokens("some-new-model"), 1024);

    let retry = config.retry.to_retry_config();
    assert_eq!(retry.max_retries, 3);
    assert_eq!(retry.max_elapsed, Duration::from_secs(120));
    assert_eq!(retry.initial_backoff, Duration::from_secs(1));
    assert_eq!(retry.max_backoff, Duration::from_secs(64));

    assert_eq!(config.storage.usage_path(), PathBuf::from("/var/lib/consultant/api_usage.json"));
}

#[test]
fn test_minimal_config_uses_defaults() {
    let file = write_config("{}");
    let config = AppConfig::load(file.path()).unwrap();

    assert_eq!(config.provider.base_url, "https://api.groq.com/openai/v1");
    assert_eq!(config.provider.timeout, 60);
    assert_eq!(config.retry.max_retries, 8);
    assert_eq!(config.default_model(), ModelName::Mixtral8x7b);
    assert_eq!(config.storage.history_path(), PathBuf::from("./chat_history.json"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let cases = [
        r#"{"provider": {"baseUrl": "ftp://example.com"}}"#,
        r#"{"provider": {"timeout": 0}}"#,
        r#"{"apiKeys": {"fetch": ["gsk_a", "  "]}}"#,
        r#"{"apiKeys": {"fetch": ["gsk a"]}}"#,
        r#"{"retry": {"initialBackoffMs": 5000, "maxBackoffMs": 1000}}"#,
        r#"{"defaultMaxTokens": 0}"#,
        r#"{"apiKeys": {"summarize": ["gsk_a"]}}"#,
        "not json",
    ];

    for case in cases {
        let file = write_config(case);
        assert!(AppConfig::load(file.path()).is_err(), "accepted {}", case);
    }
}

#[test]
fn test_missing_config_file() {
    assert!(AppConfig::load(std::path::Path::new("/nonexistent/consultant.json")).is_err());
}

#[test]
fn test_key_helpers() {
    assert_eq!(key_var(ActionKind::Fetch), "CONSULTANT_FETCH_KEYS");
    assert_eq!(key_var(ActionKind::Evaluate), "CONSULTANT_EVALUATE_KEYS");
    assert_eq!(split_keys(" k1, k2 ,,k3 "), vec!["k1", "k2", "k3"]);
    assert!(split_keys("").is_empty());
}

// Every environment-dependent assertion lives in this one test so parallel
// test threads never observe each other's variables.
#[test]
fn test_environment_layering() {
    cleanup_test_env();

    env::set_var("CONSULTANT_BASE_URL", "http://localhost:8080/v1");
    env::set_var("CONSULTANT_TIMEOUT", "15");
    env::set_var("CONSULTANT_DATA_DIR", "/tmp/consultant-data");
    env::set_var("CONSULTANT_MAX_RETRIES", "2");
    env::set_var("CONSULTANT_FETCH_KEYS", "env_1,env_2");

    let settings = Settings::new().unwrap();
    assert_eq!(settings.api_keys.get(&ActionKind::Fetch).unwrap(), &vec!["env_1", "env_2"]);
    assert!(!settings.api_keys.contains_key(&ActionKind::Refine));

    let file = write_config(r#"{"apiKeys": {"fetch": ["file_1"], "refine": ["file_2"]}}"#);
    let mut config = AppConfig::load(file.path()).unwrap();
    settings.apply_to(&mut config);

    assert_eq!(config.provider.base_url, "http://localhost:8080/v1");
    assert_eq!(config.provider.timeout, 15);
    assert_eq!(config.retry.max_retries, 2);
    assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/consultant-data"));
    assert_eq!(config.keys_for(ActionKind::Fetch), ["env_1", "env_2"]);
    assert_eq!(config.keys_for(ActionKind::Refine), ["file_2"]);
    assert!(config.validate().is_ok());

    env::set_var("CONSULTANT_TIMEOUT", "soon");
    assert!(Settings::new().is_err());
    env::set_var("CONSULTANT_TIMEOUT", "0");
    assert!(Settings::new().is_err());
    env::remove_var("CONSULTANT_TIMEOUT");

    env::set_var("LOG_FORMAT", "xml");
    assert!(Settings::new().is_err());
    env::remove_var("LOG_FORMAT");

    // A blank credential line from a .env template must not wipe the file pool
    env::set_var("CONSULTANT_FETCH_KEYS", "");
    env::set_var("CONSULTANT_REFINE_KEYS", " , ");
    let settings = Settings::new().unwrap();
    assert!(settings.api_keys.is_empty());

    let mut config = AppConfig::load(file.path()).unwrap();
    settings.apply_to(&mut config);
    assert_eq!(config.keys_for(ActionKind::Fetch), ["file_1"]);
    assert_eq!(config.keys_for(ActionKind::Refine), ["file_2"]);

    cleanup_test_env();
}
