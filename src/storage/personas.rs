//! Expert persona store

use super::JsonStore;
use crate::models::Persona;
use crate::utils::error::AppResult;
use std::path::PathBuf;

/// Personas backed by `agents.json`
#[derive(Debug, Clone)]
pub struct PersonaStore {
    store: JsonStore<Persona>,
}

impl PersonaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
        }
    }

    pub fn list(&self) -> AppResult<Vec<Persona>> {
        self.store.load()
    }

    /// First persona with exactly this title
    pub fn find(&self, title: &str) -> AppResult<Option<Persona>> {
        Ok(self.list()?.into_iter().find(|p| p.title == title))
    }

    pub fn save(&self, persona: Persona) -> AppResult<()> {
        self.store.append(persona)
    }
}
