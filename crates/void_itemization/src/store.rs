//! The entry store
//!
//! [`EntryStore`] owns every [`ItemEntry`] of one inventory and runs the
//! give/remove/combine algorithm through each definition's policy chain.
//!
//! While a [`ScopeLock`] is held the backing list is never structurally
//! changed. Gives, removals and clear-all requested in that window are
//! queued and replayed when the outermost lock is released (see
//! [`crate::guard`]).

use crate::config::ItemizationConfig;
use crate::context::{ActionContext, ActionOrigin};
use crate::definition::{DefinitionId, ItemDefinition};
use crate::entry::{EntrySnapshot, ItemEntry, ItemHandle, ItemInstance, ItemState};
use crate::error::{ItemizationError, Result};
use crate::guard::{PendingAdd, PendingQueue, PendingRemove, ScopeLock};
use crate::notify::{ChangeNotifier, DirtyMarks, DirtyTracker, ItemChange};
use crate::policy::{EntryTemplate, InventoryView, LifecycleContext};
use crate::registry::DefinitionRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use void_core::{HandleAllocator, NamedId};
use void_event::SubscriberId;

/// How much of an entry to remove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantity {
    #[default]
    All,
    /// `Count(0)` removes everything, like `All`
    Count(u32),
}

impl Quantity {
    /// Check if removing this quantity empties a stack of `stack_count`
    pub fn covers(self, stack_count: u32) -> bool {
        match self {
            Self::All | Self::Count(0) => true,
            Self::Count(n) => n >= stack_count,
        }
    }
}

impl From<u32> for Quantity {
    fn from(count: u32) -> Self {
        Self::Count(count)
    }
}

/// Outcome of a mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    /// Took effect before the call returned
    Applied,
    /// Deferred until the outermost scope lock is released
    Queued,
    /// Not performed
    Rejected(ItemizationError),
}

/// Result of a give
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiveResult {
    /// Last entry touched, or the handle reserved for a queued give
    pub handle: ItemHandle,
    /// Units that could not be placed
    pub excess: u32,
    pub status: OpStatus,
}

impl GiveResult {
    fn rejected(count: u32, error: ItemizationError) -> Self {
        Self {
            handle: ItemHandle::null(),
            excess: count,
            status: OpStatus::Rejected(error),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == OpStatus::Applied
    }

    pub fn is_queued(&self) -> bool {
        self.status == OpStatus::Queued
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.status, OpStatus::Rejected(_))
    }
}

/// What applying a replicated snapshot changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicationSummary {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    /// Snapshots whose definition could not be resolved
    pub unresolved: usize,
    /// Deferred until the outermost scope lock is released
    pub queued: bool,
}

/// A replicated entry with its definition looked up
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSnapshot {
    handle: ItemHandle,
    definition: Arc<ItemDefinition>,
    stack_count: u32,
    source: Option<NamedId>,
}

/// Ordered collection of item entries
pub struct EntryStore {
    pub(crate) entries: Vec<ItemEntry>,
    allocator: Arc<HandleAllocator<ItemEntry>>,
    pub(crate) config: ItemizationConfig,
    registry: Option<Arc<DefinitionRegistry>>,
    notifier: ChangeNotifier<ItemChange>,
    dirty: DirtyTracker,
    pub(crate) lock_depth: u32,
    pub(crate) pending: PendingQueue,
    pub(crate) diagnostics: Vec<ItemizationError>,
}

impl EntryStore {
    /// Create a store with its own handle allocator
    pub fn new(config: ItemizationConfig) -> Self {
        Self {
            entries: Vec::new(),
            allocator: Arc::new(HandleAllocator::new()),
            config,
            registry: None,
            notifier: ChangeNotifier::new(),
            dirty: DirtyTracker::default(),
            lock_depth: 0,
            pending: PendingQueue::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Share a handle allocator with other stores
    pub fn with_allocator(mut self, allocator: Arc<HandleAllocator<ItemEntry>>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Attach a registry for [`give_by_id`](Self::give_by_id)
    pub fn with_registry(mut self, registry: Arc<DefinitionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &ItemizationConfig {
        &self.config
    }

    pub fn allocator(&self) -> &Arc<HandleAllocator<ItemEntry>> {
        &self.allocator
    }

    pub fn registry(&self) -> Option<&Arc<DefinitionRegistry>> {
        self.registry.as_ref()
    }

    pub fn is_authority(&self) -> bool {
        self.config.is_authority()
    }

    pub fn notifier_mut(&mut self) -> &mut ChangeNotifier<ItemChange> {
        &mut self.notifier
    }

    /// Subscribe to entry changes
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&ItemChange) + Send + Sync + 'static,
    {
        self.notifier.subscribe(handler)
    }

    // ------------------------------------------------------------------
    // Give
    // ------------------------------------------------------------------

    /// Give `count` units of `definition`.
    ///
    /// Units are combined into existing stacks of the same definition in
    /// store order, then placed in new stacks while the policy chain allows
    /// it. Whatever cannot be placed is reported as `excess`.
    ///
    /// While the store is locked the give is queued and the returned handle
    /// is the one the first entry it creates will receive.
    pub fn give(
        &mut self,
        definition: &Arc<ItemDefinition>,
        count: u32,
        origin: ActionOrigin,
    ) -> GiveResult {
        if let Err(e) = self.check_authority("give") {
            return GiveResult::rejected(count, e);
        }
        if let Err(e) = definition.validate() {
            log::warn!("Rejected give of {} unit(s): {}", count, e);
            return GiveResult::rejected(count, e);
        }
        if count == 0 {
            return GiveResult {
                handle: ItemHandle::null(),
                excess: 0,
                status: OpStatus::Applied,
            };
        }

        if self.is_locked() {
            let reserved = self.allocator.next();
            log::trace!(
                "Queued give of {} x{} as {} (lock depth {})",
                definition.id,
                count,
                reserved,
                self.lock_depth
            );
            self.pending.adds.push(PendingAdd {
                definition: definition.clone(),
                count,
                origin,
                reserved,
            });
            return GiveResult {
                handle: reserved,
                excess: 0,
                status: OpStatus::Queued,
            };
        }

        self.give_now(definition, count, &origin, None)
    }

    /// Give by definition id through the attached registry
    pub fn give_by_id(
        &mut self,
        id: &DefinitionId,
        count: u32,
        origin: ActionOrigin,
    ) -> GiveResult {
        let definition = match &self.registry {
            Some(registry) => registry.resolve(id),
            None => Err(ItemizationError::InvalidDefinition(format!(
                "no registry attached to resolve {}",
                id
            ))),
        };
        match definition {
            Ok(definition) => self.give(&definition, count, origin),
            Err(e) => {
                log::warn!("Rejected give of {} x{}: {}", id, count, e);
                GiveResult::rejected(count, e)
            }
        }
    }

    pub(crate) fn give_now(
        &mut self,
        definition: &Arc<ItemDefinition>,
        count: u32,
        origin: &ActionOrigin,
        mut reserved: Option<ItemHandle>,
    ) -> GiveResult {
        let chain = definition.chain();
        let mut ctx = self.evaluate(definition, count, origin);
        let max = ctx.effective_max_stack_size();
        let template = EntryTemplate {
            definition,
            origin,
        };
        let mut last_handle = ItemHandle::null();

        if ctx.is_stackable() {
            for idx in 0..self.entries.len() {
                if ctx.delta == 0 {
                    break;
                }
                let candidate = &self.entries[idx];
                if !candidate.is_live() || candidate.definition_id() != &definition.id {
                    continue;
                }
                let room = max.saturating_sub(candidate.stack_count);
                if room == 0 || !chain.can_combine(&template, candidate, &ctx) {
                    continue;
                }

                let moved = room.min(ctx.delta);
                let candidate = &mut self.entries[idx];
                let old_count = candidate.stack_count;
                candidate.stack_count += moved;
                candidate.last_observed_stack_count = candidate.stack_count;
                let (handle, new_count) = (candidate.handle, candidate.stack_count);
                ctx.delta -= moved;

                log::debug!(
                    "Combined {} x{} into {} ({} -> {})",
                    definition.id,
                    moved,
                    handle,
                    old_count,
                    new_count
                );
                self.record_changed(handle, old_count, new_count);
                last_handle = handle;
            }
        }

        while ctx.delta > 0 {
            let view = InventoryView::new(&self.entries);
            if !chain.can_create_new_stack(&template, &ctx, &view) {
                break;
            }

            let amount = ctx.delta.min(max);
            let handle = reserved.take().unwrap_or_else(|| self.allocator.next());
            let mut entry =
                ItemEntry::new(handle, definition.clone(), amount, origin.source.clone());
            if definition.wants_instance {
                let mut instance = ItemInstance::new(ItemState::Owned);
                chain.on_instance_created(&self.lifecycle(handle), &mut instance);
                entry.instance = Some(instance);
            }
            self.entries.push(entry);
            ctx.delta -= amount;

            log::debug!("Created {} with {} x{}", handle, definition.id, amount);
            self.record_added(handle, amount);
            last_handle = handle;
        }

        if let Some(unused) = reserved {
            log::trace!("Reserved handle {} was not needed by give of {}", unused, definition.id);
        }

        GiveResult {
            handle: last_handle,
            excess: ctx.delta,
            status: OpStatus::Applied,
        }
    }

    // ------------------------------------------------------------------
    // Remove
    // ------------------------------------------------------------------

    /// Remove units from an entry.
    ///
    /// Removing the whole stack requires every policy's consent; a veto
    /// leaves the entry untouched and returns `false`. While locked, the
    /// removal is validated now, queued, and `true` is returned.
    pub fn remove(&mut self, handle: ItemHandle, quantity: impl Into<Quantity>) -> bool {
        let quantity = quantity.into();
        if self.check_authority("remove").is_err() {
            return false;
        }

        if self.is_locked() {
            let Some(entry) = self.find(handle) else {
                log::warn!(
                    "Cannot remove {}: {}",
                    handle,
                    ItemizationError::HandleNotFound(handle)
                );
                return false;
            };
            let full = quantity.covers(entry.stack_count);
            if full && !entry.definition.chain().can_clear_item(entry) {
                return false;
            }
            if full {
                if let Some(entry) = self.find_mut(handle) {
                    entry.pending_remove = true;
                }
            }
            log::trace!(
                "Queued removal of {:?} from {} (lock depth {})",
                quantity,
                handle,
                self.lock_depth
            );
            self.pending.removes.push(PendingRemove { handle, quantity });
            return true;
        }

        self.remove_now(handle, quantity)
    }

    pub(crate) fn remove_now(&mut self, handle: ItemHandle, quantity: Quantity) -> bool {
        let Some(idx) = self.index_of(handle) else {
            log::warn!("Cannot remove {}: {}", handle, ItemizationError::HandleNotFound(handle));
            return false;
        };

        let entry = &self.entries[idx];
        if quantity.covers(entry.stack_count) {
            if !entry.definition.chain().can_clear_item(entry) {
                return false;
            }
            self.erase_at(idx);
            return true;
        }

        let taken = match quantity {
            Quantity::Count(n) => n,
            Quantity::All => entry.stack_count,
        };
        let entry = &mut self.entries[idx];
        let old_count = entry.stack_count;
        entry.stack_count -= taken;
        entry.last_observed_stack_count = entry.stack_count;
        let new_count = entry.stack_count;

        log::debug!("Removed {} unit(s) from {} ({} -> {})", taken, handle, old_count, new_count);
        self.record_changed(handle, old_count, new_count);
        true
    }

    /// Erase an entry, running destroy hooks first
    fn erase_at(&mut self, idx: usize) {
        let mut entry = self.entries.remove(idx);
        let lc = self.lifecycle(entry.handle);
        if let Some(instance) = entry.instance.as_mut() {
            entry.definition.chain().on_instance_destroyed(&lc, instance);
        }

        log::debug!("Erased {} ({} x{})", entry.handle, entry.definition.id, entry.stack_count);
        self.notifier.emit(ItemChange::Removed {
            handle: entry.handle,
            last_count: entry.stack_count,
        });
        self.dirty.mark_collection();
    }

    // ------------------------------------------------------------------
    // Clear all
    // ------------------------------------------------------------------

    /// Remove every entry whose policies include it in clear-all.
    ///
    /// While locked, the clear is deferred and wins over every give queued
    /// in the same locked region.
    pub fn clear_all(&mut self) -> OpStatus {
        if let Err(e) = self.check_authority("clear_all") {
            return OpStatus::Rejected(e);
        }
        if self.is_locked() {
            log::trace!("Queued clear-all (lock depth {})", self.lock_depth);
            self.pending.clear_all = true;
            return OpStatus::Queued;
        }
        self.clear_all_now();
        OpStatus::Applied
    }

    pub(crate) fn clear_all_now(&mut self) -> usize {
        let mut idx = 0;
        let mut cleared = 0;
        while idx < self.entries.len() {
            let entry = &self.entries[idx];
            if entry.definition.chain().include_in_clear_all(entry) {
                self.erase_at(idx);
                cleared += 1;
            } else {
                idx += 1;
            }
        }
        log::debug!("Cleared {} entr(ies), {} kept", cleared, self.entries.len());
        cleared
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Find a live entry
    pub fn find(&self, handle: ItemHandle) -> Option<&ItemEntry> {
        self.entries.iter().find(|e| e.handle == handle && e.is_live())
    }

    /// Find a live entry for in-place changes.
    ///
    /// Changes made through the reference are not reported; call
    /// [`mark_dirty`](Self::mark_dirty) afterwards.
    pub fn find_mut(&mut self, handle: ItemHandle) -> Option<&mut ItemEntry> {
        self.entries.iter_mut().find(|e| e.handle == handle && e.is_live())
    }

    pub fn contains(&self, handle: ItemHandle) -> bool {
        self.find(handle).is_some()
    }

    /// All entries in store order, including ones waiting for removal
    pub fn entries(&self) -> &[ItemEntry] {
        &self.entries
    }

    /// Policy view of the live entries
    pub fn view(&self) -> InventoryView<'_> {
        InventoryView::new(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live entries of a definition, optionally only those with room left
    pub fn items_of_type(&self, id: &DefinitionId, incomplete_only: bool) -> Vec<&ItemEntry> {
        self.view()
            .items_of_type(id)
            .filter(|e| !incomplete_only || !self.is_stack_full(e))
            .collect()
    }

    /// Total live units of a definition
    pub fn count_of(&self, id: &DefinitionId) -> u64 {
        self.view().items_of_type(id).map(|e| e.stack_count as u64).sum()
    }

    /// Check if an entry holds its definition's max stack size
    pub fn is_stack_full(&self, entry: &ItemEntry) -> bool {
        let ctx = self.evaluate(&entry.definition, 0, &ActionOrigin::default());
        entry.stack_count >= ctx.effective_max_stack_size()
    }

    /// Visit every live entry in store order under a scope lock.
    ///
    /// The callback may give, remove or clear; structural changes are queued
    /// and applied after the last entry has been visited.
    pub fn for_each_entry<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut EntryStore, ItemHandle),
    {
        let mut lock = self.scope_lock();
        let len = lock.entries.len();
        for idx in 0..len {
            let entry = &lock.entries[idx];
            if !entry.is_live() {
                continue;
            }
            let handle = entry.handle;
            f(&mut *lock, handle);
        }
    }

    // ------------------------------------------------------------------
    // Locking
    // ------------------------------------------------------------------

    /// Acquire a scope lock. Locks nest; the queue flushes when the
    /// outermost one drops.
    pub fn scope_lock(&mut self) -> ScopeLock<'_> {
        ScopeLock::new(self)
    }

    pub fn is_locked(&self) -> bool {
        self.lock_depth > 0
    }

    pub fn lock_depth(&self) -> u32 {
        self.lock_depth
    }

    /// Number of operations waiting for the lock to release
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // ------------------------------------------------------------------
    // Dirty tracking and diagnostics
    // ------------------------------------------------------------------

    /// Report an in-place change made through [`find_mut`](Self::find_mut)
    pub fn mark_dirty(&mut self, handle: ItemHandle) {
        if self.is_authority() {
            self.dirty.mark_item(handle);
        } else {
            self.dirty.mark_collection();
        }
    }

    /// Dirty marks accumulated so far
    pub fn dirty(&self) -> DirtyMarks {
        self.dirty.peek()
    }

    /// Hand the accumulated dirty marks to a transport
    pub fn take_dirty(&mut self) -> DirtyMarks {
        self.dirty.take()
    }

    /// Warnings recorded since the last call
    pub fn take_diagnostics(&mut self) -> Vec<ItemizationError> {
        std::mem::take(&mut self.diagnostics)
    }

    // ------------------------------------------------------------------
    // Replication
    // ------------------------------------------------------------------

    /// Persisted form of every live entry, in store order
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.view().live().map(ItemEntry::snapshot).collect()
    }

    /// Bring a replica in line with the authority's snapshot.
    ///
    /// Entries missing from `snapshots` are removed, new ones added with the
    /// authority's handles, and count differences reported as changes. The
    /// store is reordered to match the snapshot. While locked, definitions
    /// are resolved now and the rest is deferred.
    pub fn apply_replicated(
        &mut self,
        snapshots: &[EntrySnapshot],
        registry: &DefinitionRegistry,
    ) -> Result<ReplicationSummary> {
        if self.is_authority() {
            log::warn!("Ignored replicated snapshot on an authority store");
            return Err(ItemizationError::ReplicaOnly);
        }

        let mut unresolved = 0;
        let mut resolved = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            match registry.get(&snapshot.definition_id) {
                Some(definition) => resolved.push(ResolvedSnapshot {
                    handle: snapshot.handle,
                    definition,
                    stack_count: snapshot.stack_count,
                    source: snapshot.source_id.clone(),
                }),
                None => {
                    log::error!(
                        "Replicated entry {} references unknown definition {}",
                        snapshot.handle,
                        snapshot.definition_id
                    );
                    unresolved += 1;
                }
            }
        }

        if self.is_locked() {
            self.pending.replicated = Some(resolved);
            return Ok(ReplicationSummary {
                unresolved,
                queued: true,
                ..Default::default()
            });
        }

        let mut summary = self.apply_resolved(resolved);
        summary.unresolved = unresolved;
        Ok(summary)
    }

    pub(crate) fn apply_resolved(&mut self, incoming: Vec<ResolvedSnapshot>) -> ReplicationSummary {
        let mut summary = ReplicationSummary::default();
        let keep: HashSet<ItemHandle> = incoming.iter().map(|s| s.handle).collect();

        let mut idx = 0;
        while idx < self.entries.len() {
            if keep.contains(&self.entries[idx].handle) {
                idx += 1;
            } else {
                self.erase_at(idx);
                summary.removed += 1;
            }
        }

        let mut order = HashMap::with_capacity(incoming.len());
        for (position, snapshot) in incoming.into_iter().enumerate() {
            order.insert(snapshot.handle, position);
            match self.index_of(snapshot.handle) {
                Some(idx) => {
                    let entry = &mut self.entries[idx];
                    entry.definition = snapshot.definition;
                    entry.source = snapshot.source;
                    entry.stack_count = snapshot.stack_count;
                    let old_count = entry.last_observed_stack_count;
                    if old_count != snapshot.stack_count {
                        entry.last_observed_stack_count = snapshot.stack_count;
                        self.record_changed(snapshot.handle, old_count, snapshot.stack_count);
                        summary.changed += 1;
                    }
                }
                None => {
                    let handle = snapshot.handle;
                    let count = snapshot.stack_count;
                    let mut entry =
                        ItemEntry::new(handle, snapshot.definition, count, snapshot.source);
                    if entry.definition.wants_instance {
                        let mut instance = ItemInstance::new(ItemState::Owned);
                        entry
                            .definition
                            .chain()
                            .on_instance_created(&self.lifecycle(handle), &mut instance);
                        entry.instance = Some(instance);
                    }
                    self.entries.push(entry);
                    self.record_added(handle, count);
                    summary.added += 1;
                }
            }
        }

        self.entries
            .sort_by_key(|e| order.get(&e.handle).copied().unwrap_or(usize::MAX));
        if summary.added + summary.removed + summary.changed > 0 {
            self.dirty.mark_collection();
        }
        log::debug!(
            "Applied replicated state: {} added, {} removed, {} changed",
            summary.added,
            summary.removed,
            summary.changed
        );
        summary
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn evaluate(
        &self,
        definition: &ItemDefinition,
        delta: u32,
        origin: &ActionOrigin,
    ) -> ActionContext {
        let mut ctx = ActionContext::new(delta, &self.config)
            .with_instigator(origin.instigator.clone());
        definition.chain().evaluate_context(&mut ctx);
        ctx
    }

    /// Index of an entry, live or waiting for removal
    fn index_of(&self, handle: ItemHandle) -> Option<usize> {
        self.entries.iter().position(|e| e.handle == handle)
    }

    pub(crate) fn lifecycle(&self, handle: ItemHandle) -> LifecycleContext {
        LifecycleContext {
            handle,
            authority: self.is_authority(),
        }
    }

    fn record_added(&mut self, handle: ItemHandle, count: u32) {
        self.notifier.emit(ItemChange::Added { handle, count });
        self.mark_dirty(handle);
    }

    fn record_changed(&mut self, handle: ItemHandle, old_count: u32, new_count: u32) {
        self.notifier.emit(ItemChange::Changed {
            handle,
            old_count,
            new_count,
        });
        self.mark_dirty(handle);
    }

    pub(crate) fn check_authority(&self, operation: &str) -> Result<()> {
        if self.is_authority() {
            return Ok(());
        }
        if self.config.strict_authority {
            panic!("{} called on a replica store", operation);
        }
        log::warn!(
            "Ignored {} on a replica store: {}",
            operation,
            ItemizationError::NotAuthoritative
        );
        Err(ItemizationError::NotAuthoritative)
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new(ItemizationConfig::default())
    }
}

impl std::fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("entries", &self.entries.len())
            .field("role", &self.config.role)
            .field("lock_depth", &self.lock_depth)
            .field("pending", &self.pending.len())
            .finish()
    }
}
