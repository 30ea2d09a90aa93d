//! Data models module
//!
//! Defines completion requests, the provider wire format and persisted records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod completion;
pub mod openai;
pub mod records;

pub use completion::{get_max_tokens, CompletionRequest, ModelCatalog, ModelName, DEFAULT_MAX_TOKENS};
pub use records::{ChatHistoryEntry, Persona, Reference, UsageLogEntry};

/// Logical call-site category; each action rotates through its own credential pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Persona selection and the main answer
    Fetch,
    /// Second pass over the answer
    Refine,
    /// Critical evaluation of the answer
    Evaluate,
}

impl ActionKind {
    /// All actions in pipeline order
    pub const ALL: [ActionKind; 3] = [ActionKind::Fetch, ActionKind::Refine, ActionKind::Evaluate];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Fetch => "fetch",
            ActionKind::Refine => "refine",
            ActionKind::Evaluate => "evaluate",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fetch" => Ok(ActionKind::Fetch),
            "refine" => Ok(ActionKind::Refine),
            "evaluate" => Ok(ActionKind::Evaluate),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trip_through_str() {
        for action in ActionKind::ALL {
            assert_eq!(action.as_str().parse::<ActionKind>(), Ok(action));
        }
        assert!("summarize".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_action_serializes_lowercase() {
        let json = serde_json::to_string(&ActionKind::Evaluate).unwrap();
        assert_eq!(json, "\"evaluate\"");
    }
}
