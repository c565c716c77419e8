//! Subscriber types for the reactive system.
//!
//! A Subscriber is any computation that can be re-run when a reactive value
//! it read is written. Effects are the only subscribers in this crate; the
//! component render loop is built on top of them.

use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Each subscriber gets a unique ID when created. The dependency graph keys
/// its per-property effect sets by this ID, which is what makes duplicate
/// registration idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation that can be notified when one of its dependencies changes.
///
/// The dependency graph only ever holds weak references to subscribers, so
/// dropping the owning handle is enough to stop notifications.
pub trait Subscriber {
    /// The subscriber's unique ID.
    fn id(&self) -> SubscriberId;

    /// Whether the subscriber is currently executing.
    ///
    /// `trigger` skips running subscribers so an effect writing a value it
    /// depends on does not re-enter itself.
    fn is_running(&self) -> bool;

    /// Re-run the subscriber synchronously.
    fn notify(self: Rc<Self>);
}
