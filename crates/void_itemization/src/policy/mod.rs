//! Component policies
//!
//! Each item definition carries an ordered list of [`ItemComponent`]s. Every
//! component implements [`ComponentPolicy`]; a [`PolicyChain`] runs them in
//! list order. Accumulating calls (`evaluate_context`, lifecycle hooks) visit
//! every policy. Gating calls stop at the first policy that answers `false`.

mod ability;
mod display;
mod equipment;
mod stacking;
mod tagging;
mod traits;

pub use ability::{AbilityGrantPolicy, AbilitySpec};
pub use display::IconPolicy;
pub use equipment::{EquipmentPolicy, VisualSpec};
pub use stacking::{MaxStackSizePolicy, SlotSizePolicy};
pub use tagging::{LimitByTagPolicy, OwnedTagsPolicy};
pub use traits::{ItemTrait, TraitsPolicy};

use crate::context::{ActionContext, ActionOrigin};
use crate::definition::{DefinitionId, ItemDefinition};
use crate::entry::{ItemEntry, ItemHandle, ItemInstance, ItemState};
use crate::equipment::EquipmentSlot;
use crate::tags::{Tag, TagSet};
use serde::{Deserialize, Serialize};

/// The entry a give would create, before it exists
#[derive(Debug, Clone, Copy)]
pub struct EntryTemplate<'a> {
    pub definition: &'a ItemDefinition,
    pub origin: &'a ActionOrigin,
}

/// Passed to lifecycle hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleContext {
    pub handle: ItemHandle,
    /// Whether the store holding the entry has mutation authority
    pub authority: bool,
}

/// Read-only view of a store's entries for policies.
///
/// Entries waiting for removal are invisible.
#[derive(Debug, Clone, Copy)]
pub struct InventoryView<'a> {
    entries: &'a [ItemEntry],
}

impl<'a> InventoryView<'a> {
    pub fn new(entries: &'a [ItemEntry]) -> Self {
        Self { entries }
    }

    /// Live entries in store order
    pub fn live(self) -> impl Iterator<Item = &'a ItemEntry> {
        self.entries.iter().filter(|e| e.is_live())
    }

    /// Live entries of one definition
    pub fn items_of_type<'b>(self, id: &'b DefinitionId) -> impl Iterator<Item = &'a ItemEntry> + 'b
    where
        'a: 'b,
    {
        self.live().filter(move |e| e.definition_id() == id)
    }

    /// Number of live entries counted under a tag limit
    pub fn count_limited_by(self, tag: &Tag) -> usize {
        self.live()
            .filter(|e| e.definition.limit_tags().any(|t| t == tag))
            .count()
    }
}

/// Behavior an item component contributes to stacking and lifecycle.
///
/// Every method has a permissive default, so a policy only overrides what it
/// cares about.
pub trait ComponentPolicy {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Contribute to the context before any gating call
    fn evaluate_context(&self, _ctx: &mut ActionContext) {}

    /// May units from `this` be merged into `candidate`?
    fn can_combine(
        &self,
        _this: &EntryTemplate<'_>,
        _candidate: &ItemEntry,
        _ctx: &ActionContext,
    ) -> bool {
        true
    }

    /// May a new entry be created for `template`?
    fn can_create_new_stack(
        &self,
        _template: &EntryTemplate<'_>,
        _ctx: &ActionContext,
        _view: &InventoryView<'_>,
    ) -> bool {
        true
    }

    /// May the entry be removed entirely?
    fn can_clear_item(&self, _entry: &ItemEntry) -> bool {
        true
    }

    /// Should clear-all remove the entry?
    fn include_in_clear_all(&self, _entry: &ItemEntry) -> bool {
        true
    }

    /// The entry moved between owned and equipped
    fn on_state_changed(
        &self,
        _lc: &LifecycleContext,
        _state: ItemState,
        _instance: &mut ItemInstance,
    ) {
    }

    /// A runtime instance was built for a new entry
    fn on_instance_created(&self, _lc: &LifecycleContext, _instance: &mut ItemInstance) {}

    /// The entry owning the instance is about to be erased
    fn on_instance_destroyed(&self, _lc: &LifecycleContext, _instance: &mut ItemInstance) {}
}

/// The built-in item components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemComponent {
    MaxStackSize(MaxStackSizePolicy),
    SlotSize(SlotSizePolicy),
    OwnedTags(OwnedTagsPolicy),
    Traits(TraitsPolicy),
    LimitByTag(LimitByTagPolicy),
    Equipment(EquipmentPolicy),
    AbilityGrant(AbilityGrantPolicy),
    Icon(IconPolicy),
}

impl ItemComponent {
    pub fn max_stack_size(max: u32) -> Self {
        Self::MaxStackSize(MaxStackSizePolicy { max })
    }

    pub fn slot_size(size: u32) -> Self {
        Self::SlotSize(SlotSizePolicy { size })
    }

    pub fn owned_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        Self::OwnedTags(OwnedTagsPolicy {
            tags: tags.into_iter().collect::<TagSet>(),
        })
    }

    pub fn traits(traits: impl IntoIterator<Item = ItemTrait>) -> Self {
        Self::Traits(TraitsPolicy {
            traits: traits.into_iter().collect(),
        })
    }

    pub fn limit_by_tag(tag: &str, limit: u32) -> Self {
        Self::LimitByTag(LimitByTagPolicy {
            tag: Tag::new(tag),
            limit,
        })
    }

    pub fn equipment(slot: EquipmentSlot) -> Self {
        Self::Equipment(EquipmentPolicy::new(slot))
    }

    pub fn ability_grant(abilities: impl IntoIterator<Item = AbilitySpec>) -> Self {
        Self::AbilityGrant(AbilityGrantPolicy {
            abilities: abilities.into_iter().collect(),
        })
    }

    pub fn icon(path: impl Into<String>) -> Self {
        Self::Icon(IconPolicy { path: path.into() })
    }

    /// Dispatch target for this component
    pub fn as_policy(&self) -> &dyn ComponentPolicy {
        match self {
            Self::MaxStackSize(p) => p,
            Self::SlotSize(p) => p,
            Self::OwnedTags(p) => p,
            Self::Traits(p) => p,
            Self::LimitByTag(p) => p,
            Self::Equipment(p) => p,
            Self::AbilityGrant(p) => p,
            Self::Icon(p) => p,
        }
    }

    /// Check authored data, returning the reason it is unusable
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::LimitByTag(p) if p.tag.is_empty() => Err("limit_by_tag has an empty tag".into()),
            Self::AbilityGrant(p) => match p.abilities.iter().find(|a| a.ability.is_empty()) {
                Some(_) => Err("ability_grant has an empty ability id".into()),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

/// Runs a definition's components in order
#[derive(Debug, Clone, Copy)]
pub struct PolicyChain<'a> {
    components: &'a [ItemComponent],
}

impl<'a> PolicyChain<'a> {
    pub fn new(components: &'a [ItemComponent]) -> Self {
        Self { components }
    }

    fn policies(&self) -> impl Iterator<Item = &'a dyn ComponentPolicy> {
        self.components.iter().map(ItemComponent::as_policy)
    }

    /// Run every policy's context evaluation
    pub fn evaluate_context(&self, ctx: &mut ActionContext) {
        for policy in self.policies() {
            policy.evaluate_context(ctx);
        }
    }

    pub fn can_combine(
        &self,
        this: &EntryTemplate<'_>,
        candidate: &ItemEntry,
        ctx: &ActionContext,
    ) -> bool {
        match self.first_veto(|p| p.can_combine(this, candidate, ctx)) {
            Some(name) => {
                log::trace!("combine into {} vetoed by {}", candidate.handle, name);
                false
            }
            None => true,
        }
    }

    pub fn can_create_new_stack(
        &self,
        template: &EntryTemplate<'_>,
        ctx: &ActionContext,
        view: &InventoryView<'_>,
    ) -> bool {
        match self.first_veto(|p| p.can_create_new_stack(template, ctx, view)) {
            Some(name) => {
                log::debug!("new stack of {} vetoed by {}", template.definition.id, name);
                false
            }
            None => true,
        }
    }

    pub fn can_clear_item(&self, entry: &ItemEntry) -> bool {
        match self.first_veto(|p| p.can_clear_item(entry)) {
            Some(name) => {
                log::debug!("clear of {} vetoed by {}", entry.handle, name);
                false
            }
            None => true,
        }
    }

    pub fn include_in_clear_all(&self, entry: &ItemEntry) -> bool {
        self.policies().all(|p| p.include_in_clear_all(entry))
    }

    pub fn on_state_changed(
        &self,
        lc: &LifecycleContext,
        state: ItemState,
        instance: &mut ItemInstance,
    ) {
        for policy in self.policies() {
            policy.on_state_changed(lc, state, instance);
        }
    }

    pub fn on_instance_created(&self, lc: &LifecycleContext, instance: &mut ItemInstance) {
        for policy in self.policies() {
            policy.on_instance_created(lc, instance);
        }
    }

    pub fn on_instance_destroyed(&self, lc: &LifecycleContext, instance: &mut ItemInstance) {
        for policy in self.policies() {
            policy.on_instance_destroyed(lc, instance);
        }
    }

    /// Name of the first policy answering `false`
    fn first_veto<F>(&self, mut gate: F) -> Option<&'static str>
    where
        F: FnMut(&dyn ComponentPolicy) -> bool,
    {
        self.policies().find(|p| !gate(*p)).map(|p| p.name())
    }
}
