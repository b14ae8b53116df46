//! Item definitions

use crate::error::{ItemizationError, Result};
use crate::policy::{EquipmentPolicy, ItemComponent, PolicyChain};
use crate::tags::{Tag, TagSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use void_core::NamedId;

/// Identifier of an item definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionId(pub NamedId);

impl DefinitionId {
    pub fn new(name: &str) -> Self {
        Self(NamedId::new(name))
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }
}

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DefinitionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Item definition
///
/// Immutable once shared. Entries hold it behind an `Arc` and never mutate
/// it; all per-stack state lives in the entry's instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Unique identifier
    pub id: DefinitionId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Policy chain, evaluated in order
    #[serde(default)]
    pub components: Vec<ItemComponent>,
    /// Cosmetic components that never take part in gating
    #[serde(default)]
    pub display: Vec<ItemComponent>,
    /// Whether entries get a runtime instance when created
    #[serde(default)]
    pub wants_instance: bool,
}

impl ItemDefinition {
    /// Create a new item definition
    pub fn new(id: &str, name: impl Into<String>) -> Self {
        Self {
            id: DefinitionId::new(id),
            name: name.into(),
            description: String::new(),
            components: Vec::new(),
            display: Vec::new(),
            wants_instance: false,
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Append a policy component
    pub fn with_component(mut self, component: ItemComponent) -> Self {
        self.components.push(component);
        self
    }

    /// Append a display-only component
    pub fn with_display(mut self, component: ItemComponent) -> Self {
        self.display.push(component);
        self
    }

    /// Request a runtime instance for every entry
    pub fn with_instance(mut self, wants_instance: bool) -> Self {
        self.wants_instance = wants_instance;
        self
    }

    /// The policy chain of this definition
    pub fn chain(&self) -> PolicyChain<'_> {
        PolicyChain::new(&self.components)
    }

    /// The equipment policy, if the definition has one
    pub fn equipment(&self) -> Option<&EquipmentPolicy> {
        self.components.iter().find_map(|c| match c {
            ItemComponent::Equipment(policy) => Some(policy),
            _ => None,
        })
    }

    /// Tags this definition is counted under by tag limits
    pub fn limit_tags(&self) -> impl Iterator<Item = &Tag> {
        self.components.iter().filter_map(|c| match c {
            ItemComponent::LimitByTag(policy) => Some(&policy.tag),
            _ => None,
        })
    }

    /// All tags the definition owns
    pub fn owned_tags(&self) -> TagSet {
        let mut set = TagSet::new();
        for component in &self.components {
            if let ItemComponent::OwnedTags(policy) = component {
                set.extend_from(&policy.tags);
            }
        }
        set
    }

    /// Icon path from the display components
    pub fn icon(&self) -> Option<&str> {
        self.display.iter().find_map(|c| match c {
            ItemComponent::Icon(icon) => Some(icon.path.as_str()),
            _ => None,
        })
    }

    /// Check the definition can be used by a store
    pub fn validate(&self) -> Result<()> {
        if self.id.0.is_empty() {
            return Err(ItemizationError::InvalidDefinition(
                "definition id is empty".to_string(),
            ));
        }
        for component in &self.components {
            component.validate().map_err(|reason| {
                ItemizationError::InvalidDefinition(format!("{}: {}", self.id, reason))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ItemTrait;

    #[test]
    fn test_item_definition() {
        let potion = ItemDefinition::new("health_potion", "Health Potion")
            .with_description("Restores health")
            .with_component(ItemComponent::max_stack_size(10))
            .with_component(ItemComponent::owned_tags(["Item.Consumable"]))
            .with_display(ItemComponent::icon("icons/potion.png"));

        assert_eq!(potion.id.name(), "health_potion");
        assert_eq!(potion.components.len(), 2);
        assert_eq!(potion.icon(), Some("icons/potion.png"));
        assert!(potion.owned_tags().has(&Tag::new("Item")));
        assert!(potion.equipment().is_none());
        assert!(potion.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let def = ItemDefinition::new("", "Nameless");
        assert!(matches!(def.validate(), Err(ItemizationError::InvalidDefinition(_))));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "id": "key",
            "name": "Dungeon Key",
            "wants_instance": true,
            "components": [
                { "type": "traits", "traits": ["single_stack", "ignore_clear_all"] },
                { "type": "limit_by_tag", "tag": "Item.Key", "limit": 3 }
            ]
        }"#;
        let def: ItemDefinition = serde_json::from_str(json).unwrap();

        assert!(def.wants_instance);
        assert_eq!(def.limit_tags().count(), 1);
        match &def.components[0] {
            ItemComponent::Traits(t) => assert!(t.has(ItemTrait::SingleStack)),
            other => panic!("unexpected component {:?}", other),
        }
    }
}
