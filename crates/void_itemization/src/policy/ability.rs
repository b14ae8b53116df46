//! Ability grants

use super::{ComponentPolicy, LifecycleContext};
use crate::entry::{ItemInstance, ItemState};
use serde::{Deserialize, Serialize};
use void_core::NamedId;

/// One ability and the state in which the item grants it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySpec {
    pub ability: NamedId,
    #[serde(default)]
    pub active_state: ItemState,
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    1
}

impl AbilitySpec {
    /// Ability granted while the item is owned
    pub fn owned(ability: &str) -> Self {
        Self {
            ability: NamedId::new(ability),
            active_state: ItemState::Owned,
            level: 1,
        }
    }

    /// Ability granted while the item is equipped
    pub fn equipped(ability: &str) -> Self {
        Self {
            ability: NamedId::new(ability),
            active_state: ItemState::Equipped,
            level: 1,
        }
    }

    /// Set level
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

/// Grants abilities to the holder of an item.
///
/// Only the authority grants. Grants are recorded on the entry's instance so
/// entries sharing the definition never see each other's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityGrantPolicy {
    pub abilities: Vec<AbilitySpec>,
}

impl AbilityGrantPolicy {
    fn specs_for(&self, state: ItemState) -> impl Iterator<Item = &AbilitySpec> {
        self.abilities.iter().filter(move |a| a.active_state == state)
    }
}

impl ComponentPolicy for AbilityGrantPolicy {
    fn name(&self) -> &'static str {
        "ability_grant"
    }

    fn on_instance_created(&self, lc: &LifecycleContext, instance: &mut ItemInstance) {
        if !lc.authority {
            return;
        }
        for spec in self.specs_for(ItemState::Owned) {
            if instance.grant(spec.ability.clone(), spec.level) {
                log::debug!("{} granted {}", lc.handle, spec.ability);
            }
        }
    }

    fn on_state_changed(
        &self,
        lc: &LifecycleContext,
        state: ItemState,
        instance: &mut ItemInstance,
    ) {
        if !lc.authority {
            return;
        }
        for spec in self.specs_for(ItemState::Equipped) {
            match state {
                ItemState::Equipped => {
                    if instance.grant(spec.ability.clone(), spec.level) {
                        log::debug!("{} granted {} on equip", lc.handle, spec.ability);
                    }
                }
                ItemState::Owned => {
                    if instance.revoke(&spec.ability) {
                        log::debug!("{} revoked {} on unequip", lc.handle, spec.ability);
                    }
                }
            }
        }
    }

    fn on_instance_destroyed(&self, lc: &LifecycleContext, instance: &mut ItemInstance) {
        if !lc.authority {
            return;
        }
        for spec in &self.abilities {
            instance.revoke(&spec.ability);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ItemHandle;

    fn policy() -> AbilityGrantPolicy {
        AbilityGrantPolicy {
            abilities: vec![
                AbilitySpec::owned("Ability.Light"),
                AbilitySpec::equipped("Ability.Slash"),
            ],
        }
    }

    fn authority() -> LifecycleContext {
        LifecycleContext {
            handle: ItemHandle::from_bits(1),
            authority: true,
        }
    }

    #[test]
    fn test_owned_grant_on_create() {
        let mut instance = ItemInstance::new(ItemState::Owned);
        policy().on_instance_created(&authority(), &mut instance);

        assert!(instance.has_ability(&NamedId::new("Ability.Light")));
        assert!(!instance.has_ability(&NamedId::new("Ability.Slash")));
    }

    #[test]
    fn test_equip_cycle() {
        let policy = policy();
        let lc = authority();
        let slash = NamedId::new("Ability.Slash");
        let mut instance = ItemInstance::new(ItemState::Owned);
        policy.on_instance_created(&lc, &mut instance);

        policy.on_state_changed(&lc, ItemState::Equipped, &mut instance);
        assert!(instance.has_ability(&slash));

        policy.on_state_changed(&lc, ItemState::Owned, &mut instance);
        assert!(!instance.has_ability(&slash));
        assert_eq!(instance.granted_abilities().len(), 1);

        policy.on_instance_destroyed(&lc, &mut instance);
        assert!(instance.granted_abilities().is_empty());
    }

    #[test]
    fn test_replica_never_grants() {
        let lc = LifecycleContext {
            handle: ItemHandle::from_bits(1),
            authority: false,
        };
        let mut instance = ItemInstance::new(ItemState::Owned);
        policy().on_instance_created(&lc, &mut instance);
        policy().on_state_changed(&lc, ItemState::Equipped, &mut instance);

        assert!(instance.granted_abilities().is_empty());
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let policy = policy();
        let lc = authority();
        let mut first = ItemInstance::new(ItemState::Owned);
        let mut second = ItemInstance::new(ItemState::Owned);

        policy.on_state_changed(&lc, ItemState::Equipped, &mut first);

        assert!(first.has_ability(&NamedId::new("Ability.Slash")));
        assert!(!second.has_ability(&NamedId::new("Ability.Slash")));
        policy.on_state_changed(&lc, ItemState::Owned, &mut second);
        assert!(first.has_ability(&NamedId::new("Ability.Slash")));
    }
}
