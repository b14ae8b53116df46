//! Stack size and slot size policies

use super::{ComponentPolicy, EntryTemplate};
use crate::context::ActionContext;
use crate::entry::ItemEntry;
use serde::{Deserialize, Serialize};

/// Caps how many units one entry may hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxStackSizePolicy {
    /// 0 means unlimited
    pub max: u32,
}

impl Default for MaxStackSizePolicy {
    fn default() -> Self {
        Self { max: 1 }
    }
}

impl ComponentPolicy for MaxStackSizePolicy {
    fn name(&self) -> &'static str {
        "max_stack_size"
    }

    fn evaluate_context(&self, ctx: &mut ActionContext) {
        ctx.max_stack_size = self.max;
    }

    fn can_combine(
        &self,
        _this: &EntryTemplate<'_>,
        candidate: &ItemEntry,
        ctx: &ActionContext,
    ) -> bool {
        if ctx.max_stack_size != self.max {
            log::warn!(
                "max stack size of {} overridden by a later policy ({} -> {})",
                candidate.definition_id(),
                self.max,
                ctx.max_stack_size
            );
        }
        candidate.stack_count < ctx.effective_max_stack_size()
    }
}

/// How many inventory slots one entry occupies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSizePolicy {
    pub size: u32,
}

impl Default for SlotSizePolicy {
    fn default() -> Self {
        Self { size: 1 }
    }
}

impl ComponentPolicy for SlotSizePolicy {
    fn name(&self) -> &'static str {
        "slot_size"
    }

    fn evaluate_context(&self, ctx: &mut ActionContext) {
        ctx.slot_size = self.size;
    }
}
