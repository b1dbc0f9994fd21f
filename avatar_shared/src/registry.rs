//! Animation registry.
//!
//! Name -> (clip, action) lookup, filled as clip assets arrive and read-only
//! afterwards. The state machine only starts once every [`StateName`] has an
//! entry.

use std::{collections::HashMap, fmt};

use tracing::info;

use crate::{
    fsm::StateName,
    mixer::{ActionId, ClipId},
};

/// One registered animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationEntry {
    pub clip: ClipId,
    pub action: ActionId,
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Entries are immutable once inserted.
    Duplicate(String),
    Missing(StateName),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Duplicate(name) => write!(f, "animation '{}' already registered", name),
            RegistryError::Missing(state) => write!(f, "no animation registered for '{}'", state),
        }
    }
}

impl std::error::Error for RegistryError {}

#[derive(Debug, Default)]
pub struct AnimationRegistry {
    entries: HashMap<String, AnimationEntry>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, entry: AnimationEntry) -> Result<(), RegistryError> {
        if self.entries.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        info!(name, clip = entry.clip.0, action = entry.action.0, "Animation registered");
        self.entries.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AnimationEntry> {
        self.entries.get(name)
    }

    /// Entry backing a state's animation.
    pub fn entry(&self, state: StateName) -> Result<&AnimationEntry, RegistryError> {
        self.get(state.as_str())
            .ok_or(RegistryError::Missing(state))
    }

    /// States that still lack an animation.
    pub fn missing(&self) -> Vec<StateName> {
        StateName::ALL
            .into_iter()
            .filter(|s| !self.entries.contains_key(s.as_str()))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
