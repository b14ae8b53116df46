//! # void_event - Typed Event Delivery
//!
//! Two ways to observe a stream of typed events:
//! - [`Listeners`]: synchronous, priority-ordered callbacks run at emit time
//! - [`EventChannel`]: a multi-producer queue drained by the consumer later
//!
//! Both are single-type. A producer that wants both kinds of observers holds
//! one of each and feeds every event to both.

use crossbeam_channel::{unbounded, TryRecvError};

pub use crossbeam_channel::{Receiver, Sender};

/// Listener priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Trait for events
pub trait Event: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> Event for T {}

/// Event handler function type
pub type EventHandler<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

/// Synchronous listeners for one event type.
///
/// Higher priority listeners run first; listeners of equal priority run in
/// subscription order.
pub struct Listeners<E: Event> {
    handlers: Vec<(SubscriberId, Priority, EventHandler<E>)>,
    next_subscriber_id: u64,
}

impl<E: Event> Listeners<E> {
    /// Create an empty listener list
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_subscriber_id: 1,
        }
    }

    /// Subscribe with normal priority
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_with_priority(handler, Priority::Normal)
    }

    /// Subscribe with priority
    pub fn subscribe_with_priority<F>(&mut self, handler: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;

        self.handlers.push((id, priority, Box::new(handler)));
        // Stable sort keeps subscription order within a priority
        self.handlers.sort_by(|a, b| b.1.cmp(&a.1));

        log::trace!("listener {:?} subscribed at {:?}", id, priority);
        id
    }

    /// Unsubscribe. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub_id, _, _)| *sub_id != id);
        before != self.handlers.len()
    }

    /// Run every listener on the event
    pub fn dispatch(&self, event: &E) {
        for (_, _, handler) in &self.handlers {
            handler(event);
        }
    }

    /// Number of subscribed listeners
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no listener is subscribed
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Remove every listener
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<E: Event> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.handlers.len())
            .finish()
    }
}

/// Channel for single-type events
pub struct EventChannel<E: Event> {
    sender: Sender<E>,
    receiver: Receiver<E>,
}

impl<E: Event> EventChannel<E> {
    /// Create a new channel
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Send an event
    pub fn send(&self, event: E) {
        // Both ends live in self, so the channel cannot be disconnected
        let _ = self.sender.send(event);
    }

    /// Get a sender that can feed this channel from elsewhere
    pub fn sender(&self) -> Sender<E> {
        self.sender.clone()
    }

    /// Get a receiver that observes this channel from elsewhere.
    ///
    /// Receivers share one queue: each event goes to exactly one of them.
    pub fn receiver(&self) -> Receiver<E> {
        self.receiver.clone()
    }

    /// Receive an event
    pub fn receive(&self) -> Option<E> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain all events
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }

    /// Clear all events without returning them
    pub fn clear(&self) {
        while self.receiver.try_recv().is_ok() {}
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get pending count
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl<E: Event> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("pending", &self.receiver.len())
            .finish()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{
        Event, EventChannel, EventHandler, Listeners, Priority, Receiver, Sender, SubscriberId,
    };
}
