//! Change notification and dirty tracking
//!
//! Every mutation of a store produces an [`ItemChange`] and at least one
//! dirty mark. Listeners run synchronously when the change happens; a
//! transport that prefers to poll can open a channel and drain it.

use crate::entry::ItemHandle;
use std::collections::HashSet;
use void_event::{Event, EventChannel, Listeners, Priority, Receiver, SubscriberId};

/// A change to one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    Added { handle: ItemHandle, count: u32 },
    Removed { handle: ItemHandle, last_count: u32 },
    Changed { handle: ItemHandle, old_count: u32, new_count: u32 },
}

impl ItemChange {
    pub fn handle(&self) -> ItemHandle {
        match self {
            Self::Added { handle, .. }
            | Self::Removed { handle, .. }
            | Self::Changed { handle, .. } => *handle,
        }
    }
}

/// Fans events out to listeners and an optional channel
pub struct ChangeNotifier<E: Event> {
    listeners: Listeners<E>,
    channel: Option<EventChannel<E>>,
}

impl<E: Event> ChangeNotifier<E> {
    pub fn new() -> Self {
        Self {
            listeners: Listeners::new(),
            channel: None,
        }
    }

    /// Deliver an event to every listener, then queue it on the channel
    pub fn emit(&self, event: E) {
        self.listeners.dispatch(&event);
        if let Some(channel) = &self.channel {
            channel.send(event);
        }
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.listeners.subscribe(handler)
    }

    pub fn subscribe_with_priority<F>(&mut self, handler: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.listeners.subscribe_with_priority(handler, priority)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Start buffering events. Events emitted earlier are not replayed.
    pub fn open_channel(&mut self) -> Receiver<E> {
        self.channel.get_or_insert_with(EventChannel::new).receiver()
    }

    /// Take every buffered event
    pub fn drain(&self) -> Vec<E> {
        self.channel.as_ref().map(EventChannel::drain).unwrap_or_default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: Event> Default for ChangeNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for ChangeNotifier<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .field("buffered", &self.channel.as_ref().map(EventChannel::len))
            .finish()
    }
}

/// Dirty marks handed to a replication transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyMarks {
    /// Entries whose fields changed, in first-mark order
    pub items: Vec<ItemHandle>,
    /// The ordered list must be walked again
    pub collection: bool,
}

impl DirtyMarks {
    pub fn is_clean(&self) -> bool {
        self.items.is_empty() && !self.collection
    }
}

/// Accumulates dirty marks between transport flushes
#[derive(Debug, Default)]
pub(crate) struct DirtyTracker {
    items: Vec<ItemHandle>,
    seen: HashSet<ItemHandle>,
    collection: bool,
}

impl DirtyTracker {
    pub(crate) fn mark_item(&mut self, handle: ItemHandle) {
        if self.seen.insert(handle) {
            self.items.push(handle);
        }
    }

    pub(crate) fn mark_collection(&mut self) {
        self.collection = true;
    }

    pub(crate) fn peek(&self) -> DirtyMarks {
        DirtyMarks {
            items: self.items.clone(),
            collection: self.collection,
        }
    }

    pub(crate) fn take(&mut self) -> DirtyMarks {
        self.seen.clear();
        DirtyMarks {
            items: std::mem::take(&mut self.items),
            collection: std::mem::take(&mut self.collection),
        }
    }
}
