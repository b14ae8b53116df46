//! Equipment binding
//!
//! Associates a subset of a store's item handles with equipped state. The
//! binding holds handles only and looks entries up in the store on every
//! call, so it never outlives or aliases the entries it refers to.

use crate::entry::{ItemHandle, ItemInstance, ItemState};
use crate::error::{ItemizationError, Result};
use crate::notify::ChangeNotifier;
use crate::policy::VisualSpec;
use crate::store::EntryStore;
use serde::{Deserialize, Serialize};
use void_core::NamedId;
use void_event::SubscriberId;

/// Equipment slot types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    /// Head armor (helmet, hat)
    Head,
    /// Chest armor
    Chest,
    /// Leg armor
    Legs,
    /// Foot armor (boots)
    Feet,
    /// Hand armor (gloves)
    Hands,
    /// Main hand weapon
    MainHand,
    /// Off hand (shield, second weapon)
    OffHand,
    /// Two-handed weapon (occupies both hands)
    TwoHand,
    /// Accessory (ring, amulet)
    Accessory,
    /// Back slot (cape, backpack)
    Back,
    /// Custom slot
    Custom(u32),
}

/// A visual spawned for an equipped item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnedVisual {
    /// Unique within one binding
    pub id: u64,
    pub spec: VisualSpec,
}

/// Runtime state of one equipped item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentInstance {
    pub slot: Option<EquipmentSlot>,
    pub visuals: Vec<SpawnedVisual>,
}

/// An equipped item. Shares its handle with the store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentEntry {
    pub handle: ItemHandle,
    pub instance: EquipmentInstance,
    pub source: Option<NamedId>,
}

/// Equipment events for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipmentChange {
    /// Spawn `visuals`
    Equipped {
        handle: ItemHandle,
        slot: Option<EquipmentSlot>,
        visuals: Vec<SpawnedVisual>,
    },
    /// Destroy `visuals`
    Unequipped {
        handle: ItemHandle,
        visuals: Vec<SpawnedVisual>,
    },
}

/// Equipped items of one store
#[derive(Debug, Default)]
pub struct EquipmentBinding {
    entries: Vec<EquipmentEntry>,
    notifier: ChangeNotifier<EquipmentChange>,
    next_visual_id: u64,
}

impl EquipmentBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equip a live entry of `store`.
    ///
    /// Moves the entry's instance to [`ItemState::Equipped`] (creating the
    /// instance if the definition did not ask for one) and runs the policy
    /// chain's state hooks. Only an authority store may equip.
    pub fn equip(&mut self, store: &mut EntryStore, handle: ItemHandle) -> Result<ItemHandle> {
        store.check_authority("equip")?;

        let Some(entry) = store.find(handle) else {
            if let Some(idx) = self.position(handle) {
                let stale = self.entries.remove(idx);
                self.despawn(stale);
            }
            return Err(ItemizationError::HandleNotFound(handle));
        };
        if self.position(handle).is_some() {
            return Err(ItemizationError::AlreadyEquipped(handle));
        }
        let definition = entry.definition.clone();
        let source = entry.source.clone();
        let policy = match definition.equipment() {
            Some(policy) if policy.can_be_equipped => policy,
            _ => return Err(ItemizationError::NotEquippable(handle)),
        };

        let visuals: Vec<SpawnedVisual> = policy
            .visuals
            .iter()
            .map(|spec| {
                self.next_visual_id += 1;
                SpawnedVisual {
                    id: self.next_visual_id,
                    spec: spec.clone(),
                }
            })
            .collect();

        let lc = store.lifecycle(handle);
        if let Some(entry) = store.find_mut(handle) {
            let instance = entry
                .instance
                .get_or_insert_with(|| ItemInstance::new(ItemState::Owned));
            instance.state = ItemState::Equipped;
            definition
                .chain()
                .on_state_changed(&lc, ItemState::Equipped, instance);
        }
        store.mark_dirty(handle);

        log::debug!(
            "Equipped {} ({}) in {:?} with {} visual(s)",
            handle,
            definition.id,
            policy.slot,
            visuals.len()
        );
        self.entries.push(EquipmentEntry {
            handle,
            instance: EquipmentInstance {
                slot: policy.slot,
                visuals: visuals.clone(),
            },
            source,
        });
        self.notifier.emit(EquipmentChange::Equipped {
            handle,
            slot: policy.slot,
            visuals,
        });
        Ok(handle)
    }

    /// Unequip an item. Returns false if it was not equipped or the store
    /// is a replica.
    pub fn unequip(&mut self, store: &mut EntryStore, handle: ItemHandle) -> bool {
        if store.check_authority("unequip").is_err() {
            return false;
        }
        let Some(idx) = self.position(handle) else {
            log::warn!("Cannot unequip {}: not equipped", handle);
            return false;
        };
        let removed = self.entries.remove(idx);

        let lc = store.lifecycle(handle);
        if let Some(entry) = store.find_mut(handle) {
            let chain = entry.definition.chain();
            if let Some(instance) = entry.instance.as_mut() {
                instance.state = ItemState::Owned;
                chain.on_state_changed(&lc, ItemState::Owned, instance);
            }
            store.mark_dirty(handle);
        }

        self.despawn(removed);
        true
    }

    /// Drop equipment whose item no longer has a live entry.
    /// Returns how many were dropped.
    pub fn prune(&mut self, store: &EntryStore) -> usize {
        let (stale, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| !store.contains(e.handle));
        self.entries = live;

        let count = stale.len();
        for entry in stale {
            log::debug!("Pruned equipment for removed item {}", entry.handle);
            self.despawn(entry);
        }
        count
    }

    fn despawn(&mut self, entry: EquipmentEntry) {
        for visual in &entry.instance.visuals {
            log::trace!(
                "Destroying visual {} ({}) of {}",
                visual.id,
                visual.spec.asset,
                entry.handle
            );
        }
        self.notifier.emit(EquipmentChange::Unequipped {
            handle: entry.handle,
            visuals: entry.instance.visuals,
        });
    }

    /// Index of a record, whether or not its item is still live
    fn position(&self, handle: ItemHandle) -> Option<usize> {
        self.entries.iter().position(|e| e.handle == handle)
    }

    /// Equipment of `handle`, if its item is still live in `store`
    pub fn get<'a>(
        &'a self,
        store: &'a EntryStore,
        handle: ItemHandle,
    ) -> Option<&'a EquipmentEntry> {
        self.iter(store).find(|e| e.handle == handle)
    }

    pub fn is_equipped(&self, store: &EntryStore, handle: ItemHandle) -> bool {
        self.get(store, handle).is_some()
    }

    /// Equipped item occupying a slot
    pub fn in_slot<'a>(
        &'a self,
        store: &'a EntryStore,
        slot: EquipmentSlot,
    ) -> Option<&'a EquipmentEntry> {
        self.iter(store).find(|e| e.instance.slot == Some(slot))
    }

    /// Equipped items with a live entry, in equip order
    pub fn iter<'a>(&'a self, store: &'a EntryStore) -> impl Iterator<Item = &'a EquipmentEntry> {
        self.entries.iter().filter(move |e| store.contains(e.handle))
    }

    pub fn len(&self, store: &EntryStore) -> usize {
        self.iter(store).count()
    }

    pub fn is_empty(&self, store: &EntryStore) -> bool {
        self.iter(store).next().is_none()
    }

    pub fn notifier_mut(&mut self) -> &mut ChangeNotifier<EquipmentChange> {
        &mut self.notifier
    }

    /// Subscribe to equipment changes
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&EquipmentChange) + Send + Sync + 'static,
    {
        self.notifier.subscribe(handler)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ItemizationConfig;
    use crate::context::ActionOrigin;
    use crate::definition::ItemDefinition;
    use crate::entry::EntrySnapshot;
    use crate::policy::{EquipmentPolicy, ItemComponent};
    use crate::registry::DefinitionRegistry;
    use crate::store::Quantity;
    use std::sync::Arc;

    fn helmet() -> Arc<ItemDefinition> {
        Arc::new(
            ItemDefinition::new("iron_helmet", "Iron Helmet").with_component(
                ItemComponent::Equipment(
                    EquipmentPolicy::new(EquipmentSlot::Head)
                        .with_visual(VisualSpec::new("meshes/helmet")),
                ),
            ),
        )
    }

    #[test]
    fn test_equip_item() {
        let mut store = EntryStore::default();
        let mut binding = EquipmentBinding::new();
        let handle = store.give(&helmet(), 1, ActionOrigin::default()).handle;

        assert_eq!(binding.equip(&mut store, handle), Ok(handle));
        assert!(binding.is_equipped(&store, handle));
        assert_eq!(
            binding.in_slot(&store, EquipmentSlot::Head).map(|e| e.handle),
            Some(handle)
        );
        assert_eq!(store.find(handle).map(|e| e.state()), Some(ItemState::Equipped));
        assert_eq!(binding.get(&store, handle).unwrap().instance.visuals.len(), 1);
    }

    #[test]
    fn test_unequip() {
        let mut store = EntryStore::default();
        let mut binding = EquipmentBinding::new();
        let handle = store.give(&helmet(), 1, ActionOrigin::default()).handle;
        binding.equip(&mut store, handle).unwrap();

        assert!(binding.unequip(&mut store, handle));
        assert!(!binding.unequip(&mut store, handle));
        assert!(binding.is_empty(&store));
        assert_eq!(store.find(handle).map(|e| e.state()), Some(ItemState::Owned));
    }

    #[test]
    fn test_removed_item_is_not_equipped() {
        let mut store = EntryStore::default();
        let mut binding = EquipmentBinding::new();
        let handle = store.give(&helmet(), 1, ActionOrigin::default()).handle;
        binding.equip(&mut store, handle).unwrap();

        assert!(store.remove(handle, Quantity::All));

        assert!(!binding.is_equipped(&store, handle));
        assert!(binding.in_slot(&store, EquipmentSlot::Head).is_none());
        assert!(binding.get(&store, handle).is_none());
        assert_eq!(binding.len(&store), 0);
    }

    #[test]
    fn test_equip_drops_stale_record() {
        let mut store = EntryStore::default();
        let mut binding = EquipmentBinding::new();
        let handle = store.give(&helmet(), 1, ActionOrigin::default()).handle;
        binding.equip(&mut store, handle).unwrap();
        store.remove(handle, Quantity::All);

        assert_eq!(
            binding.equip(&mut store, handle),
            Err(ItemizationError::HandleNotFound(handle))
        );
        assert_eq!(binding.prune(&store), 0);
    }

    #[test]
    fn test_replica_cannot_equip() {
        let registry = DefinitionRegistry::new();
        registry.register((*helmet()).clone()).unwrap();
        let mut replica = EntryStore::new(ItemizationConfig::replica());
        let handle = ItemHandle::from_bits(1);
        replica
            .apply_replicated(
                &[EntrySnapshot {
                    handle,
                    definition_id: helmet().id.clone(),
                    stack_count: 1,
                    source_id: None,
                }],
                &registry,
            )
            .unwrap();
        replica.take_dirty();
        let mut binding = EquipmentBinding::new();

        assert_eq!(
            binding.equip(&mut replica, handle),
            Err(ItemizationError::NotAuthoritative)
        );
        assert_eq!(replica.find(handle).map(|e| e.state()), Some(ItemState::Owned));
        assert!(binding.is_empty(&replica));
        assert!(!binding.unequip(&mut replica, handle));
        assert!(replica.take_dirty().is_clean());
    }

    #[test]
    #[should_panic(expected = "equip called on a replica store")]
    fn test_strict_replica_equip_panics() {
        let mut replica = EntryStore::new(ItemizationConfig::replica().with_strict_authority(true));
        let mut binding = EquipmentBinding::new();
        let _ = binding.equip(&mut replica, ItemHandle::from_bits(1));
    }

    #[test]
    fn test_not_equippable() {
        let rock = Arc::new(ItemDefinition::new("rock", "Rock"));
        let mut store = EntryStore::default();
        let mut binding = EquipmentBinding::new();
        let handle = store.give(&rock, 1, ActionOrigin::default()).handle;

        assert_eq!(
            binding.equip(&mut store, handle),
            Err(ItemizationError::NotEquippable(handle))
        );
        assert!(binding.is_empty(&store));
    }

    #[test]
    fn test_disabled_equipment_policy() {
        let mut policy = EquipmentPolicy::new(EquipmentSlot::MainHand);
        policy.can_be_equipped = false;
        let def = Arc::new(
            ItemDefinition::new("broken_sword", "Broken Sword")
                .with_component(ItemComponent::Equipment(policy)),
        );
        let mut store = EntryStore::default();
        let mut binding = EquipmentBinding::new();
        let handle = store.give(&def, 1, ActionOrigin::default()).handle;

        assert_eq!(
            binding.equip(&mut store, handle),
            Err(ItemizationError::NotEquippable(handle))
        );
    }
}
