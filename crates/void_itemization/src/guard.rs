//! Scope lock and the pending queue
//!
//! A [`ScopeLock`] marks a region in which the store's entry list must keep
//! its shape, typically because a caller is walking it by index. Inside the
//! region:
//!
//! - gives are queued with their handle reserved up front
//! - removals are validated, flagged and queued
//! - clear-all is recorded
//! - in-place count changes are still allowed
//!
//! When the outermost lock drops, queued work is flushed in a fixed order. A
//! recorded clear-all runs first and discards every queued give (reported
//! through a warning and a store diagnostic); queued removals still apply to
//! the entries clear-all kept. Otherwise removals run before gives, each in
//! queue order.

use crate::context::ActionOrigin;
use crate::definition::ItemDefinition;
use crate::entry::ItemHandle;
use crate::error::ItemizationError;
use crate::store::{EntryStore, Quantity, ResolvedSnapshot};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct PendingAdd {
    pub(crate) definition: Arc<ItemDefinition>,
    pub(crate) count: u32,
    pub(crate) origin: ActionOrigin,
    pub(crate) reserved: ItemHandle,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingRemove {
    pub(crate) handle: ItemHandle,
    pub(crate) quantity: Quantity,
}

/// Work deferred while the store is locked
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    pub(crate) adds: Vec<PendingAdd>,
    pub(crate) removes: Vec<PendingRemove>,
    pub(crate) clear_all: bool,
    pub(crate) replicated: Option<Vec<ResolvedSnapshot>>,
}

impl PendingQueue {
    pub(crate) fn len(&self) -> usize {
        self.adds.len()
            + self.removes.len()
            + usize::from(self.clear_all)
            + usize::from(self.replicated.is_some())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RAII scope lock over an [`EntryStore`].
///
/// Dereferences to the store, so the locked store is used through the lock.
/// Locks nest: taking another lock through this one only deepens the count.
pub struct ScopeLock<'a> {
    store: &'a mut EntryStore,
}

impl<'a> ScopeLock<'a> {
    pub(crate) fn new(store: &'a mut EntryStore) -> Self {
        store.lock_depth += 1;
        log::trace!("Scope lock acquired (depth {})", store.lock_depth);
        Self { store }
    }

    /// Current nesting depth
    pub fn depth(&self) -> u32 {
        self.store.lock_depth
    }

    /// Release now instead of at end of scope
    pub fn release(self) {}
}

impl Deref for ScopeLock<'_> {
    type Target = EntryStore;

    fn deref(&self) -> &EntryStore {
        &*self.store
    }
}

impl DerefMut for ScopeLock<'_> {
    fn deref_mut(&mut self) -> &mut EntryStore {
        &mut *self.store
    }
}

impl Drop for ScopeLock<'_> {
    fn drop(&mut self) {
        let store = &mut *self.store;
        store.lock_depth = store.lock_depth.saturating_sub(1);
        log::trace!("Scope lock released (depth {})", store.lock_depth);

        if store.lock_depth == 0 && !store.pending.is_empty() {
            if std::thread::panicking() {
                log::error!("Dropping {} pending operation(s) during a panic", store.pending.len());
                store.pending = PendingQueue::default();
                return;
            }
            store.flush_pending();
        }
    }
}

impl std::fmt::Debug for ScopeLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeLock")
            .field("depth", &self.store.lock_depth)
            .finish()
    }
}

impl EntryStore {
    /// Replay queued work. Only called with the lock fully released.
    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        log::trace!("Flushing {} pending operation(s)", pending.len());

        for entry in &mut self.entries {
            entry.pending_remove = false;
        }

        if pending.clear_all {
            self.clear_all_now();

            if !pending.adds.is_empty() {
                let outcome = ItemizationError::AmbiguousScopeLockOutcome {
                    discarded_adds: pending.adds.len(),
                };
                for add in &pending.adds {
                    log::warn!(
                        "Discarded queued give of {} x{} (reserved {}): {}",
                        add.definition.id,
                        add.count,
                        add.reserved,
                        outcome
                    );
                }
                if self.config.report_discarded_adds {
                    self.diagnostics.push(outcome);
                }
            }
            for remove in pending.removes {
                if self.entries.iter().any(|e| e.handle == remove.handle) {
                    log::debug!("Applying queued removal from {} kept by clear-all", remove.handle);
                    self.remove_now(remove.handle, remove.quantity);
                } else {
                    log::trace!("Queued removal from {} superseded by clear-all", remove.handle);
                }
            }
        } else {
            for remove in pending.removes {
                self.remove_now(remove.handle, remove.quantity);
            }
            for add in pending.adds {
                self.give_now(&add.definition, add.count, &add.origin, Some(add.reserved));
            }
        }

        if let Some(replicated) = pending.replicated {
            self.apply_resolved(replicated);
        }
    }
}
