//! Tag policies

use super::{ComponentPolicy, EntryTemplate, InventoryView};
use crate::context::ActionContext;
use crate::tags::{Tag, TagSet};
use serde::{Deserialize, Serialize};

/// Tags every entry of the definition carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedTagsPolicy {
    pub tags: TagSet,
}

impl ComponentPolicy for OwnedTagsPolicy {
    fn name(&self) -> &'static str {
        "owned_tags"
    }

    fn evaluate_context(&self, ctx: &mut ActionContext) {
        ctx.context_tags.extend_from(&self.tags);
    }
}

/// Limits how many entries sharing `tag` a store may hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitByTagPolicy {
    pub tag: Tag,
    /// 0 means unlimited
    #[serde(default)]
    pub limit: u32,
}

impl ComponentPolicy for LimitByTagPolicy {
    fn name(&self) -> &'static str {
        "limit_by_tag"
    }

    fn evaluate_context(&self, ctx: &mut ActionContext) {
        if !self.tag.is_empty() {
            ctx.context_tags.add(self.tag.clone());
        }
    }

    fn can_create_new_stack(
        &self,
        template: &EntryTemplate<'_>,
        _ctx: &ActionContext,
        view: &InventoryView<'_>,
    ) -> bool {
        if self.tag.is_empty() || self.limit == 0 {
            return true;
        }
        let count = view.count_limited_by(&self.tag);
        log::trace!(
            "{} entries under {} (limit {}) when creating {}",
            count,
            self.tag,
            self.limit,
            template.definition.id
        );
        count < self.limit as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ActionOrigin;
    use crate::definition::ItemDefinition;
    use crate::entry::{ItemEntry, ItemHandle};
    use crate::policy::ItemComponent;
    use crate::config::ItemizationConfig;
    use std::sync::Arc;

    #[test]
    fn test_limit_counts_live_entries_only() {
        let def = Arc::new(
            ItemDefinition::new("key", "Key")
                .with_component(ItemComponent::limit_by_tag("Item.Key", 2)),
        );
        let policy = LimitByTagPolicy {
            tag: Tag::new("Item.Key"),
            limit: 2,
        };
        let origin = ActionOrigin::default();
        let template = EntryTemplate { definition: &def, origin: &origin };
        let ctx = ActionContext::new(1, &ItemizationConfig::default());

        let mut entries = vec![
            ItemEntry::new(ItemHandle::from_bits(1), def.clone(), 1, None),
            ItemEntry::new(ItemHandle::from_bits(2), def.clone(), 1, None),
        ];
        assert!(!policy.can_create_new_stack(&template, &ctx, &InventoryView::new(&entries)));

        entries[1].pending_remove = true;
        assert!(policy.can_create_new_stack(&template, &ctx, &InventoryView::new(&entries)));
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let def = ItemDefinition::new("key", "Key");
        let policy = LimitByTagPolicy {
            tag: Tag::new("Item.Key"),
            limit: 0,
        };
        let origin = ActionOrigin::default();
        let template = EntryTemplate { definition: &def, origin: &origin };
        let ctx = ActionContext::new(1, &ItemizationConfig::default());

        assert!(policy.can_create_new_stack(&template, &ctx, &InventoryView::new(&[])));
    }
}
