//! Completion request and model token ceilings

use super::openai::{ChatCompletionRequest, ChatMessage};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Ceiling used for any model missing from the catalog
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// System message sent ahead of every user prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Built-in catalog, shared by every lookup that has no configured overrides
static BUILTIN_CATALOG: Lazy<ModelCatalog> = Lazy::new(ModelCatalog::builtin);

/// Chat model identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelName {
    Mixtral8x7b,
    Llama3_70b,
    Llama3_8b,
    Llama2_70b,
    Gemma7bIt,
    /// Any model the provider accepts that we have no ceiling for
    Custom(String),
}

impl ModelName {
    /// Models with a known token ceiling
    pub const KNOWN: [ModelName; 5] = [
        ModelName::Mixtral8x7b,
        ModelName::Llama3_70b,
        ModelName::Llama3_8b,
        ModelName::Llama2_70b,
        ModelName::Gemma7bIt,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ModelName::Mixtral8x7b => "mixtral-8x7b-32768",
            ModelName::Llama3_70b => "llama3-70b-8192",
            ModelName::Llama3_8b => "llama3-8b-8192",
            ModelName::Llama2_70b => "llama2-70b-4096",
            ModelName::Gemma7bIt => "gemma-7b-it",
            ModelName::Custom(name) => name,
        }
    }

    /// Token ceiling from the built-in table
    pub fn max_tokens(&self) -> u32 {
        match self {
            ModelName::Mixtral8x7b => 32768,
            ModelName::Llama3_70b | ModelName::Llama3_8b | ModelName::Gemma7bIt => 8192,
            ModelName::Llama2_70b => 4096,
            ModelName::Custom(_) => DEFAULT_MAX_TOKENS,
        }
    }
}

impl Default for ModelName {
    fn default() -> Self {
        ModelName::Mixtral8x7b
    }
}

impl FromStr for ModelName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Ok(ModelName::KNOWN
            .into_iter()
            .find(|known| known.as_str() == name)
            .unwrap_or_else(|| ModelName::Custom(name.to_string())))
    }
}

impl From<String> for ModelName {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl From<ModelName> for String {
    fn from(value: ModelName) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model name → token ceiling table with a default for unknown names
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCatalog {
    ceilings: BTreeMap<String, u32>,
    default_max_tokens: u32,
}

impl ModelCatalog {
    /// The five models shipped with the application
    pub fn builtin() -> Self {
        let ceilings = ModelName::KNOWN
            .iter()
            .map(|model| (model.as_str().to_string(), model.max_tokens()))
            .collect();

        Self {
            ceilings,
            default_max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Built-in table extended (or overridden) by configured ceilings
    pub fn with_overrides<I>(overrides: I, default_max_tokens: Option<u32>) -> Self
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let mut catalog = Self::builtin();
        catalog
            .ceilings
            .extend(overrides.into_iter().filter(|(_, ceiling)| *ceiling > 0));
        if let Some(default) = default_max_tokens.filter(|d| *d > 0) {
            catalog.default_max_tokens = default;
        }
        catalog
    }

    /// Never fails: unknown names resolve to the default ceiling
    pub fn max_tokens(&self, model: &str) -> u32 {
        self.ceilings
            .get(model.trim())
            .copied()
            .unwrap_or(self.default_max_tokens)
    }

    pub fn default_max_tokens(&self) -> u32 {
        self.default_max_tokens
    }

    /// Known model names, sorted
    pub fn model_names(&self) -> Vec<&str> {
        self.ceilings.keys().map(String::as_str).collect()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Token ceiling for a model name from the built-in table
pub fn get_max_tokens(model_name: &str) -> u32 {
    BUILTIN_CATALOG.max_tokens(model_name)
}

/// One logical "ask the model" request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: ModelName,
    /// Sampling temperature in [0, 1]
    pub temperature: f32,
    /// Always greater than zero
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request with the default system prompt and the model's built-in ceiling
    pub fn new(user_prompt: impl Into<String>, model: ModelName) -> Self {
        let max_tokens = model.max_tokens();
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt: user_prompt.into(),
            model,
            temperature: 0.5,
            max_tokens,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = if temperature.is_finite() {
            temperature.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Use the ceiling from a configured catalog
    pub fn with_catalog(self, catalog: &ModelCatalog) -> Self {
        let ceiling = catalog.max_tokens(self.model.as_str());
        self.with_max_tokens(ceiling)
    }

    /// Wire request for an OpenAI-compatible chat completion endpoint
    pub fn to_chat_request(&self) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.as_str().to_string(),
            messages: vec![
                ChatMessage::system(&self.system_prompt),
                ChatMessage::user(&self.user_prompt),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: 1.0,
            stop: None,
            stream: false,
        }
    }
}
