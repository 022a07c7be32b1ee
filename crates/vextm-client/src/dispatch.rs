//! Typed notice dispatch
//!
//! Fans one decoded notice out to its kind-specific subscribers and then
//! to the generic channel, synchronously, in subscription order. The key
//! set is the closed [`NoticeKind`] enumeration, so a subscription can
//! never name a kind the protocol does not have.
//!
//! Handlers run with the registry unlocked: a channel's entries are
//! checked out before delivery and merged back afterwards, so a handler
//! may subscribe or unsubscribe (itself included) from inside a delivery
//! without deadlocking the reader task.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use parking_lot::Mutex;
use tracing::warn;
use vextm_core::{FieldsetNotice, NoticeKind};

/// Boxed notice callback
pub type NoticeHandler = Box<dyn FnMut(&FieldsetNotice) + Send>;

/// Handle returned by subscribe; pass to `unsubscribe` to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Channel {
    Kind(NoticeKind),
    Any,
}

struct Entry {
    id: u64,
    once: bool,
    handler: NoticeHandler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    channels: HashMap<Channel, Vec<Entry>>,
    /// Deliveries currently running with their entries checked out.
    delivering: usize,
    /// Unsubscriptions that targeted a checked-out entry; applied when
    /// the entries are merged back.
    parked_removals: Vec<u64>,
}

/// Per-connection subscriber registry.
#[derive(Default)]
pub struct EventDispatcher {
    registry: Mutex<Registry>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one notice kind.
    pub fn subscribe<F>(&self, kind: NoticeKind, handler: F) -> Subscription
    where
        F: FnMut(&FieldsetNotice) + Send + 'static,
    {
        self.insert(Channel::Kind(kind), false, Box::new(handler))
    }

    /// Subscribe to one notice kind; the handler auto-removes after its
    /// first delivery.
    pub fn subscribe_once<F>(&self, kind: NoticeKind, handler: F) -> Subscription
    where
        F: FnMut(&FieldsetNotice) + Send + 'static,
    {
        self.insert(Channel::Kind(kind), true, Box::new(handler))
    }

    /// Subscribe to every notice, regardless of kind.
    pub fn subscribe_any<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&FieldsetNotice) + Send + 'static,
    {
        self.insert(Channel::Any, false, Box::new(handler))
    }

    /// Remove a subscription. Unknown handles are ignored.
    pub fn unsubscribe(&self, subscription: Subscription) {
        let mut registry = self.registry.lock();
        let mut found = false;
        for entries in registry.channels.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.id != subscription.id);
            found |= entries.len() != before;
        }
        // The entry may be checked out for a delivery on this very
        // stack; park the removal for the merge step.
        if !found && registry.delivering > 0 {
            registry.parked_removals.push(subscription.id);
        }
    }

    /// Deliver one notice: kind-specific subscribers first, then the
    /// generic channel, all synchronously and in subscription order.
    /// Subscriptions made during delivery take effect from the next
    /// notice.
    pub fn dispatch(&self, notice: &FieldsetNotice) {
        self.fire(Channel::Kind(notice.kind()), notice);
        self.fire(Channel::Any, notice);
    }

    fn insert(&self, channel: Channel, once: bool, handler: NoticeHandler) -> Subscription {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .channels
            .entry(channel)
            .or_default()
            .push(Entry { id, once, handler });
        Subscription { id }
    }

    fn fire(&self, channel: Channel, notice: &FieldsetNotice) {
        let mut checked_out = {
            let mut registry = self.registry.lock();
            let taken = match registry.channels.get_mut(&channel) {
                Some(entries) if !entries.is_empty() => std::mem::take(entries),
                _ => return,
            };
            registry.delivering += 1;
            taken
        };

        let mut spent = Vec::new();
        for entry in checked_out.iter_mut() {
            // A panicking subscriber must not stop delivery to the rest.
            let outcome = catch_unwind(AssertUnwindSafe(|| (entry.handler)(notice)));
            if outcome.is_err() {
                warn!("notice subscriber panicked; continuing delivery");
            }
            if entry.once {
                spent.push(entry.id);
            }
        }

        let mut registry = self.registry.lock();
        registry.delivering -= 1;
        checked_out
            .retain(|e| !spent.contains(&e.id) && !registry.parked_removals.contains(&e.id));
        if registry.delivering == 0 {
            registry.parked_removals.clear();
        }

        // Entries added during delivery landed in the map; survivors go
        // back in front of them to keep insertion order.
        let entries = registry.channels.entry(channel).or_default();
        let added = std::mem::take(entries);
        *entries = checked_out;
        entries.extend(added);
    }
}
