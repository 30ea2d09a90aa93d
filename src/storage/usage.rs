//! Usage telemetry log
//!
//! One entry per completed call, aggregated per action for display.

use super::JsonStore;
use crate::models::{ActionKind, UsageLogEntry};
use crate::utils::error::AppResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Append-only usage log backed by `api_usage.json`
#[derive(Debug, Clone)]
pub struct UsageLog {
    store: JsonStore<UsageLogEntry>,
}

/// Per-action aggregate of usage entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub action: ActionKind,
    pub calls: usize,
    pub total_tokens: u64,
    pub total_time: f64,
    pub mean_tokens: f64,
    pub mean_time: f64,
}

impl UsageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn append(&self, entry: UsageLogEntry) -> AppResult<()> {
        self.store.append(entry)
    }

    pub fn load(&self) -> AppResult<Vec<UsageLogEntry>> {
        self.store.load()
    }

    pub fn reset(&self) -> AppResult<()> {
        self.store.clear()
    }

    /// Aggregates in action order; actions with no entries are omitted
    pub fn summary(&self) -> AppResult<Vec<UsageSummary>> {
        Ok(summarize(&self.load()?))
    }
}

pub fn summarize(entries: &[UsageLogEntry]) -> Vec<UsageSummary> {
    let mut grouped: BTreeMap<ActionKind, (usize, u64, f64)> = BTreeMap::new();
    for entry in entries {
        let slot = grouped.entry(entry.action).or_default();
        slot.0 += 1;
        slot.1 += u64::from(entry.tokens_used);
        slot.2 += entry.time_taken;
    }

    grouped
        .into_iter()
        .map(|(action, (calls, total_tokens, total_time))| UsageSummary {
            action,
            calls,
            total_tokens,
            total_time,
            mean_tokens: total_tokens as f64 / calls as f64,
            mean_time: total_time / calls as f64,
        })
        .collect()
}
