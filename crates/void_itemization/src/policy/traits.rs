//! Item traits

use super::{ComponentPolicy, EntryTemplate, InventoryView};
use crate::context::ActionContext;
use crate::entry::ItemEntry;
use serde::{Deserialize, Serialize};

/// Well-known behavior flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTrait {
    /// Only one entry of the definition may exist
    SingleStack,
    /// The last stack stays in the store at zero instead of being removed
    AllowEmptyFinalStack,
    /// Clear-all leaves the entry in place
    IgnoreClearAll,
    /// Not persisted across saves
    Transient,
    /// Counts toward the store's slot budget
    InventorySizeLimited,
}

/// Trait flags attached to a definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitsPolicy {
    #[serde(default)]
    pub traits: Vec<ItemTrait>,
}

impl Default for TraitsPolicy {
    fn default() -> Self {
        Self {
            traits: vec![ItemTrait::Transient, ItemTrait::InventorySizeLimited],
        }
    }
}

impl TraitsPolicy {
    pub fn has(&self, item_trait: ItemTrait) -> bool {
        self.traits.contains(&item_trait)
    }
}

impl ComponentPolicy for TraitsPolicy {
    fn name(&self) -> &'static str {
        "traits"
    }

    fn can_create_new_stack(
        &self,
        template: &EntryTemplate<'_>,
        _ctx: &ActionContext,
        view: &InventoryView<'_>,
    ) -> bool {
        if self.has(ItemTrait::SingleStack) {
            return view.items_of_type(&template.definition.id).next().is_none();
        }
        true
    }

    fn can_clear_item(&self, _entry: &ItemEntry) -> bool {
        !self.has(ItemTrait::AllowEmptyFinalStack)
    }

    fn include_in_clear_all(&self, _entry: &ItemEntry) -> bool {
        !self.has(ItemTrait::IgnoreClearAll)
    }
}
