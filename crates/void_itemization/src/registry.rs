//! Definition registry

use crate::definition::{DefinitionId, ItemDefinition};
use crate::error::{ItemizationError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared lookup of item definitions by id.
///
/// Registration takes `&self` so one registry can be shared between stores
/// behind an `Arc` and still be extended at runtime.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    definitions: RwLock<HashMap<DefinitionId, Arc<ItemDefinition>>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same id
    pub fn register(&self, definition: ItemDefinition) -> Result<Arc<ItemDefinition>> {
        definition.validate()?;
        let definition = Arc::new(definition);
        let previous = self
            .definitions
            .write()
            .insert(definition.id.clone(), definition.clone());
        if previous.is_some() {
            log::warn!("Replaced item definition {}", definition.id);
        } else {
            log::debug!("Registered item definition {}", definition.id);
        }
        Ok(definition)
    }

    pub fn get(&self, id: &DefinitionId) -> Option<Arc<ItemDefinition>> {
        self.definitions.read().get(id).cloned()
    }

    /// Look up a definition, failing with `InvalidDefinition` on a miss
    pub fn resolve(&self, id: &DefinitionId) -> Result<Arc<ItemDefinition>> {
        self.get(id)
            .ok_or_else(|| {
                ItemizationError::InvalidDefinition(format!("unknown definition {}", id))
            })
    }

    pub fn contains(&self, id: &DefinitionId) -> bool {
        self.definitions.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<DefinitionId> {
        let mut ids: Vec<_> = self.definitions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Register every definition of a JSON array. Returns how many were added.
    ///
    /// Nothing is registered if any definition fails to parse or validate.
    pub fn load_json(&self, json: &str) -> Result<usize> {
        let definitions: Vec<ItemDefinition> = serde_json::from_str(json)
            .map_err(|e| ItemizationError::InvalidDefinition(e.to_string()))?;
        for definition in &definitions {
            definition.validate()?;
        }
        let count = definitions.len();
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(count)
    }
}
