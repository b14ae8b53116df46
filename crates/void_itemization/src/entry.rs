//! Item entries and their runtime instances

use crate::definition::{DefinitionId, ItemDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use void_core::{Handle, NamedId};

/// Handle of an item entry. Equipment entries share this handle space.
pub type ItemHandle = Handle<ItemEntry>;

/// Lifecycle state of an item instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    /// Held in a store
    #[default]
    Owned,
    /// Held in a store and bound to an equipment entry
    Equipped,
}

/// Item property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemProperty {
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String value
    String(String),
}

impl ItemProperty {
    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

/// An ability granted to the owner while an item is held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedAbility {
    pub ability: NamedId,
    pub level: u32,
}

/// Per-entry runtime state.
///
/// Never shared between entries. Policies that need to remember something
/// about one stack write it here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemInstance {
    pub state: ItemState,
    granted: Vec<GrantedAbility>,
    pub properties: HashMap<String, ItemProperty>,
}

impl ItemInstance {
    pub fn new(state: ItemState) -> Self {
        Self {
            state,
            granted: Vec::new(),
            properties: HashMap::new(),
        }
    }

    /// Grant an ability. Returns false if it was already granted.
    pub fn grant(&mut self, ability: NamedId, level: u32) -> bool {
        if self.has_ability(&ability) {
            return false;
        }
        self.granted.push(GrantedAbility { ability, level });
        true
    }

    /// Revoke an ability. Returns false if it was not granted.
    pub fn revoke(&mut self, ability: &NamedId) -> bool {
        let before = self.granted.len();
        self.granted.retain(|g| &g.ability != ability);
        before != self.granted.len()
    }

    pub fn has_ability(&self, ability: &NamedId) -> bool {
        self.granted.iter().any(|g| &g.ability == ability)
    }

    /// Abilities currently granted by this instance
    pub fn granted_abilities(&self) -> &[GrantedAbility] {
        &self.granted
    }

    /// Set a property
    pub fn set_property(&mut self, key: impl Into<String>, value: ItemProperty) {
        self.properties.insert(key.into(), value);
    }

    /// Get a property
    pub fn property(&self, key: &str) -> Option<&ItemProperty> {
        self.properties.get(key)
    }
}

/// One stack of identical items in a store
#[derive(Debug, Clone)]
pub struct ItemEntry {
    pub handle: ItemHandle,
    pub definition: Arc<ItemDefinition>,
    pub instance: Option<ItemInstance>,
    pub stack_count: u32,
    /// Count last reported to observers, used to diff replicated updates
    pub last_observed_stack_count: u32,
    pub source: Option<NamedId>,
    /// Set while a removal of the whole entry waits for the scope lock
    pub pending_remove: bool,
}

impl ItemEntry {
    pub fn new(
        handle: ItemHandle,
        definition: Arc<ItemDefinition>,
        stack_count: u32,
        source: Option<NamedId>,
    ) -> Self {
        Self {
            handle,
            definition,
            instance: None,
            stack_count,
            last_observed_stack_count: stack_count,
            source,
            pending_remove: false,
        }
    }

    /// Id of the entry's definition
    pub fn definition_id(&self) -> &DefinitionId {
        &self.definition.id
    }

    /// Check if the entry is live (not waiting for removal)
    pub fn is_live(&self) -> bool {
        !self.pending_remove
    }

    /// Instance state, `Owned` when the entry has no instance
    pub fn state(&self) -> ItemState {
        self.instance.as_ref().map(|i| i.state).unwrap_or_default()
    }

    /// Persisted form of the entry
    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            handle: self.handle,
            definition_id: self.definition.id.clone(),
            stack_count: self.stack_count,
            source_id: self.source.clone(),
        }
    }
}

/// Serialized form of an entry, used for saves and replication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub handle: ItemHandle,
    pub definition_id: DefinitionId,
    pub stack_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<NamedId>,
}
