//! Dependency Storage
//!
//! `DepGraph` stores, for every observed `(target, key)`, the subscribers
//! that read it. It does not run anything itself; the runtime snapshots the
//! dependents of a key and notifies them after releasing its borrow of the
//! graph, because notified effects read (and therefore register) again.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::target::{Key, TargetId};
use crate::reactive::{Subscriber, SubscriberId};

type SubscriberSet = IndexMap<SubscriberId, Weak<dyn Subscriber>>;

/// Snapshot of the live dependents of one key, in registration order.
pub type Dependents = SmallVec<[Rc<dyn Subscriber>; 4]>;

/// Mapping from target → key → ordered set of subscribers.
#[derive(Default)]
pub struct DepGraph {
    targets: HashMap<TargetId, HashMap<Key, SubscriberSet>>,
}

impl DepGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
        }
    }

    /// Record that `subscriber` depends on `(target, key)`.
    ///
    /// Returns `true` if the edge is new. Registering the same subscriber
    /// twice keeps its original position.
    pub fn add_edge(&mut self, target: TargetId, key: Key, subscriber: &Rc<dyn Subscriber>) -> bool {
        let set = self
            .targets
            .entry(target)
            .or_default()
            .entry(key)
            .or_default();

        let id = subscriber.id();
        if set.contains_key(&id) {
            return false;
        }
        set.insert(id, Rc::downgrade(subscriber));
        true
    }

    /// Live dependents of `(target, key)` in the order they registered.
    ///
    /// Dead entries found along the way are pruned.
    pub fn dependents(&mut self, target: TargetId, key: &Key) -> Dependents {
        let Some(set) = self.targets.get_mut(&target).and_then(|keys| keys.get_mut(key)) else {
            return Dependents::new();
        };

        let mut live = Dependents::new();
        set.retain(|_, weak| match weak.upgrade() {
            Some(subscriber) => {
                live.push(subscriber);
                true
            }
            None => false,
        });
        live
    }

    /// Whether `subscriber` is registered on `(target, key)`.
    pub fn contains(&self, target: TargetId, key: &Key, subscriber: SubscriberId) -> bool {
        self.targets
            .get(&target)
            .and_then(|keys| keys.get(key))
            .is_some_and(|set| set.contains_key(&subscriber))
    }

    /// Number of subscribers registered on `(target, key)`, dead ones included.
    pub fn dependent_count(&self, target: TargetId, key: &Key) -> usize {
        self.targets
            .get(&target)
            .and_then(|keys| keys.get(key))
            .map_or(0, IndexMap::len)
    }

    /// Remove every edge that points at `subscriber`.
    pub fn remove_subscriber(&mut self, subscriber: SubscriberId) {
        for keys in self.targets.values_mut() {
            for set in keys.values_mut() {
                set.shift_remove(&subscriber);
            }
        }
    }

    /// Total number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.targets
            .values()
            .flat_map(HashMap::values)
            .map(IndexMap::len)
            .sum()
    }

    /// Number of targets that have at least one observed key.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}
