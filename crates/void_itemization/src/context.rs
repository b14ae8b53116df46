//! Per-operation action context

use crate::config::ItemizationConfig;
use crate::tags::TagSet;
use serde::{Deserialize, Serialize};
use void_core::NamedId;

/// Who asked for an operation and where the items came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOrigin {
    /// Actor that initiated the operation
    pub instigator: Option<NamedId>,
    /// Source recorded on entries created by the operation
    pub source: Option<NamedId>,
}

impl ActionOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set instigator
    pub fn with_instigator(mut self, instigator: impl Into<NamedId>) -> Self {
        self.instigator = Some(instigator.into());
        self
    }

    /// Set source
    pub fn with_source(mut self, source: impl Into<NamedId>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Mutable record threaded through one give or remove.
///
/// Built fresh for every call and dropped when it returns. Policies write
/// their contributions in `evaluate_context`; gating calls only read it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionContext {
    pub instigator: Option<NamedId>,
    /// Units still to place or remove
    pub delta: u32,
    pub slot_size: u32,
    /// Largest stack a single entry may hold (0 = unlimited)
    pub max_stack_size: u32,
    pub context_tags: TagSet,
}

impl ActionContext {
    /// Create a context for `delta` units seeded from the store config
    pub fn new(delta: u32, config: &ItemizationConfig) -> Self {
        Self {
            instigator: None,
            delta,
            slot_size: config.default_slot_size,
            max_stack_size: config.default_max_stack_size,
            context_tags: TagSet::new(),
        }
    }

    /// Set instigator
    pub fn with_instigator(mut self, instigator: Option<NamedId>) -> Self {
        self.instigator = instigator;
        self
    }

    /// Max stack size with `0` resolved to unlimited
    pub fn effective_max_stack_size(&self) -> u32 {
        if self.max_stack_size == 0 {
            u32::MAX
        } else {
            self.max_stack_size
        }
    }

    /// Check if more than one unit fits in a stack
    pub fn is_stackable(&self) -> bool {
        self.effective_max_stack_size() > 1
    }
}
