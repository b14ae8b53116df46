//! Void Itemization - Item Entries, Component Policies and Stores
//!
//! This crate owns the runtime side of itemization: a store of item stacks
//! whose stacking, limits and lifecycle are decided by the component
//! policies attached to each item definition.
//!
//! # Features
//!
//! - Immutable, shared item definitions with an ordered policy chain
//! - Give/remove/combine with per-definition stack limits and vetoes
//! - A nestable scope lock that defers structural mutation while iterating
//! - Change events and dirty marks for a replication transport
//! - Snapshots for persistence and replica synchronization
//! - An equipment binding keyed by item handle
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use void_itemization::prelude::*;
//!
//! let arrows = Arc::new(
//!     ItemDefinition::new("arrow", "Arrow").with_component(ItemComponent::max_stack_size(20)),
//! );
//!
//! let mut store = EntryStore::default();
//! let result = store.give(&arrows, 45, ActionOrigin::default());
//! assert_eq!(result.excess, 0);
//! assert_eq!(store.len(), 3);
//! assert_eq!(store.count_of(&arrows.id), 45);
//! ```

pub mod config;
pub mod context;
pub mod definition;
pub mod entry;
pub mod equipment;
pub mod error;
pub mod guard;
pub mod notify;
pub mod policy;
pub mod registry;
pub mod store;
pub mod tags;

pub mod prelude {
    pub use crate::config::{ItemizationConfig, NetRole};
    pub use crate::context::{ActionContext, ActionOrigin};
    pub use crate::definition::{DefinitionId, ItemDefinition};
    pub use crate::entry::{
        EntrySnapshot, ItemEntry, ItemHandle, ItemInstance, ItemProperty, ItemState,
    };
    pub use crate::equipment::{EquipmentBinding, EquipmentChange, EquipmentEntry, EquipmentSlot};
    pub use crate::error::{ItemizationError, Result};
    pub use crate::guard::ScopeLock;
    pub use crate::notify::{ChangeNotifier, DirtyMarks, ItemChange};
    pub use crate::policy::{ComponentPolicy, ItemComponent, ItemTrait, LifecycleContext};
    pub use crate::registry::DefinitionRegistry;
    pub use crate::store::{EntryStore, GiveResult, OpStatus, Quantity, ReplicationSummary};
    pub use crate::tags::{Tag, TagSet};
}

pub use prelude::*;
