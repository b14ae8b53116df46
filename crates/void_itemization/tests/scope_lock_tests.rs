//! Scope lock tests
//!
//! While a lock is held the entry list keeps its shape. Work requested
//! inside the locked region takes effect when the outermost lock drops.

use parking_lot::Mutex;
use std::sync::Arc;
use void_itemization::prelude::*;

fn stackable(id: &str, max: u32) -> Arc<ItemDefinition> {
    Arc::new(ItemDefinition::new(id, id).with_component(ItemComponent::max_stack_size(max)))
}

fn counts(store: &EntryStore) -> Vec<u32> {
    store.entries().iter().map(|e| e.stack_count).collect()
}

/// INVARIANT: the entry list is never structurally changed while locked
#[test]
fn invariant_no_structural_change_while_locked() {
    let def = stackable("arrow", 10);
    let mut store = EntryStore::default();
    let first = store.give(&def, 10, ActionOrigin::default()).handle;
    let second = store.give(&def, 4, ActionOrigin::default()).handle;

    let mut lock = store.scope_lock();
    let before: Vec<ItemHandle> = lock.entries().iter().map(|e| e.handle).collect();

    assert!(lock.give(&def, 25, ActionOrigin::default()).is_queued());
    assert!(lock.remove(first, Quantity::All));
    assert!(lock.remove(second, 1u32));
    assert_eq!(lock.clear_all(), OpStatus::Queued);

    let after: Vec<ItemHandle> = lock.entries().iter().map(|e| e.handle).collect();
    assert_eq!(before, after);
    assert_eq!(counts(&lock), vec![10, 4]);
}

/// INVARIANT: queued work equals the same calls made after unlocking
#[test]
fn invariant_queued_equals_direct() {
    let def = stackable("arrow", 10);

    let mut direct = EntryStore::default();
    let mut deferred = EntryStore::default();
    for store in [&mut direct, &mut deferred] {
        store.give(&def, 13, ActionOrigin::default());
    }
    let head = direct.entries()[0].handle;
    assert_eq!(head, deferred.entries()[0].handle);

    direct.remove(head, 4u32);
    direct.remove(head, 6u32);
    direct.give(&def, 9, ActionOrigin::default());

    {
        let mut lock = deferred.scope_lock();
        lock.remove(head, 4u32);
        lock.remove(head, 6u32);
        lock.give(&def, 9, ActionOrigin::default());
    }

    assert_eq!(counts(&deferred), counts(&direct));
}

#[test]
fn test_removes_flush_before_adds() {
    let def = stackable("arrow", 10);
    let mut store = EntryStore::default();
    let handle = store.give(&def, 6, ActionOrigin::default()).handle;
    {
        let mut lock = store.scope_lock();
        // Queued first, but flushed after the removal
        lock.give(&def, 3, ActionOrigin::default());
        lock.remove(handle, Quantity::All);
    }

    assert!(!store.contains(handle));
    assert_eq!(counts(&store), vec![3]);
}

#[test]
fn test_pending_remove_hides_entry() {
    let def = stackable("arrow", 10);
    let mut store = EntryStore::default();
    let handle = store.give(&def, 6, ActionOrigin::default()).handle;

    let mut lock = store.scope_lock();
    assert!(lock.remove(handle, Quantity::All));
    assert!(lock.find(handle).is_none());
    assert_eq!(lock.entries().len(), 1);
    assert!(lock.entries()[0].pending_remove);
    assert!(!lock.remove(handle, Quantity::All));
    assert_eq!(lock.count_of(&def.id), 0);
}

#[test]
fn test_locked_remove_checks_veto_now() {
    let pouch = Arc::new(
        ItemDefinition::new("pouch", "Pouch")
            .with_component(ItemComponent::traits([ItemTrait::AllowEmptyFinalStack])),
    );
    let mut store = EntryStore::default();
    let handle = store.give(&pouch, 1, ActionOrigin::default()).handle;
    {
        let mut lock = store.scope_lock();
        assert!(!lock.remove(handle, Quantity::All));
        assert!(!lock.remove(ItemHandle::from_bits(404), Quantity::All));
        assert_eq!(lock.pending_len(), 0);
    }
    assert!(store.contains(handle));
}

/// Scenario: clear-all and a give in the same locked region
#[test]
fn test_clear_all_beats_pending_add() {
    let def = stackable("arrow", 10);
    let mut store = EntryStore::default();
    store.give(&def, 7, ActionOrigin::default());
    {
        let mut lock = store.scope_lock();
        lock.clear_all();
        lock.give(&def, 5, ActionOrigin::default());
    }

    assert!(store.is_empty());
    let diagnostics = store.take_diagnostics();
    assert_eq!(
        diagnostics,
        vec![ItemizationError::AmbiguousScopeLockOutcome { discarded_adds: 1 }]
    );
    assert!(store.take_diagnostics().is_empty());
}

#[test]
fn test_clear_all_keeps_pending_removes_on_kept_entries() {
    let keepsake = Arc::new(
        ItemDefinition::new("keepsake", "Keepsake")
            .with_component(ItemComponent::max_stack_size(5))
            .with_component(ItemComponent::traits([ItemTrait::IgnoreClearAll])),
    );
    let coin = stackable("coin", 10);
    let mut store = EntryStore::default();
    store.give(&keepsake, 8, ActionOrigin::default());
    let (full, partial) = (store.entries()[0].handle, store.entries()[1].handle);
    let coins = store.give(&coin, 4, ActionOrigin::default()).handle;
    {
        let mut lock = store.scope_lock();
        assert!(lock.remove(full, 2));
        assert!(lock.remove(partial, Quantity::All));
        assert!(lock.remove(coins, 1));
        lock.clear_all();
    }

    assert_eq!(counts(&store), vec![3]);
    let entry = store.find(full).unwrap();
    assert_eq!(entry.stack_count, 3);
    assert!(!entry.pending_remove);
    assert!(!store.contains(partial));
    assert!(!store.contains(coins));
}

#[test]
fn test_for_each_entry_may_mutate() {
    let def = stackable("arrow", 10);
    let mut store = EntryStore::default();
    store.give(&def, 30, ActionOrigin::default());

    let mut visited = Vec::new();
    store.for_each_entry(|store, handle| {
        visited.push(handle);
        store.remove(handle, Quantity::All);
        store.give(&def, 1, ActionOrigin::default());
    });

    assert_eq!(visited.len(), 3);
    for handle in visited {
        assert!(!store.contains(handle));
    }
    assert_eq!(counts(&store), vec![3]);
    assert!(!store.is_locked());
}

#[test]
fn test_no_events_until_flush() {
    let def = stackable("arrow", 10);
    let mut store = EntryStore::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    store.subscribe(move |change: &ItemChange| seen_clone.lock().push(*change));

    let reserved = {
        let mut lock = store.scope_lock();
        let reserved = lock.give(&def, 4, ActionOrigin::default()).handle;
        assert!(seen.lock().is_empty());
        reserved
    };

    assert_eq!(*seen.lock(), vec![ItemChange::Added { handle: reserved, count: 4 }]);
}

#[test]
fn test_in_place_change_allowed_while_locked() {
    let def = stackable("arrow", 10);
    let mut store = EntryStore::default();
    let handle = store.give(&def, 4, ActionOrigin::default()).handle;
    store.take_dirty();

    let mut lock = store.scope_lock();
    if let Some(entry) = lock.find_mut(handle) {
        entry.stack_count = 9;
    }
    lock.mark_dirty(handle);

    assert_eq!(lock.find(handle).map(|e| e.stack_count), Some(9));
    assert_eq!(lock.dirty().items, vec![handle]);
}
