//! Records persisted to the flat JSON stores

use super::ActionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One usage telemetry record, written once per completed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub action: ActionKind,
    pub interaction_number: u32,
    pub tokens_used: u32,
    /// Wall-clock seconds, including any backoff waits
    pub time_taken: f64,
    pub user_input: String,
    pub user_prompt: String,
    pub api_response: String,
    pub agent_used: String,
    pub agent_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Prior exchange fed back into later prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub user_input: String,
    pub user_prompt: String,
    pub expert_response: String,
}

/// Expert persona the model is asked to role-play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(rename = "agente")]
    pub title: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
}

impl Persona {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Split a synthesized persona at the first period: title before it, description after.
    /// Without a period the whole text becomes the title.
    pub fn from_synthesized(text: &str) -> Self {
        match text.split_once('.') {
            Some((title, description)) => Self::new(title.trim(), description.trim()),
            None => Self::new(text.trim(), ""),
        }
    }
}

/// Bibliographic reference loaded from a JSON reference file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(alias = "titulo", default)]
    pub title: Option<String>,
    #[serde(alias = "autor", default)]
    pub author: Option<String>,
    #[serde(alias = "ano", default, deserialize_with = "lenient_string")]
    pub year: Option<String>,
    #[serde(alias = "Page", alias = "paginas", default, deserialize_with = "lenient_string")]
    pub page: Option<String>,
}

/// Accept numbers as well as strings for loosely-typed reference fields
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
