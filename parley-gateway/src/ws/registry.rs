//! Inbound message handler registry.

use parking_lot::RwLock;
use parley_core::types::MessageEnvelope;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::error;

/// A callback invoked with every decoded inbound envelope.
///
/// Handlers run on the connection task and must not block.
pub type MessageHandler = Arc<dyn Fn(&MessageEnvelope) + Send + Sync>;

/// Identifies one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Ordered collection of message handlers.
///
/// The same handler may be registered more than once; it is then invoked
/// once per registration. Dispatch works on a snapshot, so handlers may
/// register or remove handlers while being called.
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(HandlerId, MessageHandler)>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration.
    pub fn add(&self, handler: MessageHandler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, handler));
        id
    }

    /// Removes the earliest registration of `handler`.
    ///
    /// Returns false if the handler is not registered.
    pub fn remove(&self, handler: &MessageHandler) -> bool {
        let mut handlers = self.handlers.write();
        match handlers.iter().position(|(_, h)| Arc::ptr_eq(h, handler)) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes the registration with the given id.
    pub fn remove_id(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        match handlers.iter().position(|(h_id, _)| *h_id == id) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Invokes every registered handler in registration order.
    ///
    /// A panicking handler is logged and skipped; the remaining handlers still
    /// run. Returns the number of handlers that completed.
    pub fn dispatch(&self, envelope: &MessageEnvelope) -> usize {
        let snapshot: Vec<MessageHandler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        let mut completed = 0;
        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(envelope))).is_ok() {
                completed += 1;
            } else {
                error!(kind = %envelope.kind, "Message handler panicked");
            }
        }
        completed
    }
}

/// Keeps a handler registered for as long as it is alive.
///
/// Dropping the subscription removes the registration. Call
/// [`Subscription::detach`] to keep the handler registered for the lifetime
/// of the manager.
#[must_use = "dropping a Subscription unregisters its handler"]
#[derive(Debug)]
pub struct Subscription {
    id: HandlerId,
    registry: Weak<HandlerRegistry>,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(id: HandlerId, registry: &Arc<HandlerRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
            active: true,
        }
    }

    /// The registration id.
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Removes the registration now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Leaves the handler registered and returns its id.
    pub fn detach(mut self) -> HandlerId {
        self.active = false;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.active
            && let Some(registry) = self.registry.upgrade()
        {
            registry.remove_id(self.id);
        }
    }
}
