//! Reactive Runtime
//!
//! The runtime is the coordinator that connects reactive objects and
//! effects. It owns the dependency graph and the table of reactive wrappers.
//!
//! # How It Works
//!
//! 1. Reading a property of a reactive object calls [`Runtime::track`],
//!    which records an edge from `(target, key)` to the effect on top of the
//!    reactive context stack, if any.
//!
//! 2. Writing a property with a changed value calls [`Runtime::trigger`],
//!    which snapshots the live dependents of `(target, key)` and runs each
//!    one synchronously, in registration order, before returning. An effect
//!    that is already running is skipped.
//!
//! 3. Nested triggers complete before the outer loop moves on to the next
//!    dependent (depth-first).
//!
//! # Ownership
//!
//! A `Runtime` is a cheap handle; clones share one graph. Every reactive
//! wrapper holds its runtime, so reads and writes always reach the graph
//! that the application was created with.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::context::ReactiveContext;
use super::object::{ListInner, ObjectInner, Reactive, ReactiveList};
use super::subscriber::SubscriberId;
use super::value::{List, Record};
use crate::graph::{DepGraph, Key, TargetId};

struct RuntimeInner {
    graph: RefCell<DepGraph>,
    objects: RefCell<HashMap<TargetId, Weak<ObjectInner>>>,
    lists: RefCell<HashMap<TargetId, Weak<ListInner>>>,
}

/// Handle to one reactive runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime with an empty dependency graph.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                graph: RefCell::new(DepGraph::new()),
                objects: RefCell::new(HashMap::new()),
                lists: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Record that the current effect depends on `(target, key)`.
    ///
    /// A no-op when no effect is active.
    pub fn track(&self, target: TargetId, key: impl Into<Key>) {
        let Some(subscriber) = ReactiveContext::current_subscriber() else {
            return;
        };

        let key = key.into();
        let added = self
            .inner
            .graph
            .borrow_mut()
            .add_edge(target, key.clone(), &subscriber);
        if added {
            trace!(object = target.raw(), %key, subscriber = subscriber.id().raw(), "tracked dependency");
        }
    }

    /// Run every effect that depends on `(target, key)`.
    pub fn trigger(&self, target: TargetId, key: impl Into<Key>) {
        let key = key.into();
        let dependents = self.inner.graph.borrow_mut().dependents(target, &key);
        if dependents.is_empty() {
            return;
        }

        debug!(object = target.raw(), %key, dependents = dependents.len(), "trigger");
        for subscriber in dependents {
            if subscriber.is_running() {
                trace!(subscriber = subscriber.id().raw(), "skipping running effect");
                continue;
            }
            subscriber.notify();
        }
    }

    /// Wrap a record so reads track and writes trigger.
    ///
    /// Wrapping the same record twice returns the same wrapper.
    pub fn reactive(&self, record: Record) -> Reactive {
        let id = record.id();
        if let Some(existing) = self.inner.objects.borrow().get(&id).and_then(Weak::upgrade) {
            return Reactive::from_inner(existing);
        }

        let wrapper = Reactive::wrap(record, self.clone());
        let mut memo = self.inner.objects.borrow_mut();
        memo.retain(|_, entry| entry.strong_count() > 0);
        memo.insert(id, Rc::downgrade(wrapper.inner()));
        drop(memo);
        wrapper
    }

    /// Wrap a JSON object as a reactive record.
    pub fn reactive_json(&self, json: serde_json::Value) -> Reactive {
        self.reactive(Record::from_json(json))
    }

    /// Wrap a list so reads track and writes trigger.
    ///
    /// Wrapping the same list twice returns the same wrapper.
    pub fn reactive_list(&self, list: List) -> ReactiveList {
        let id = list.id();
        if let Some(existing) = self.inner.lists.borrow().get(&id).and_then(Weak::upgrade) {
            return ReactiveList::from_inner(existing);
        }

        let wrapper = ReactiveList::wrap(list, self.clone());
        let mut memo = self.inner.lists.borrow_mut();
        memo.retain(|_, entry| entry.strong_count() > 0);
        memo.insert(id, Rc::downgrade(wrapper.inner()));
        drop(memo);
        wrapper
    }

    /// Remove every dependency edge of an effect.
    pub fn untrack(&self, subscriber: SubscriberId) {
        self.inner.graph.borrow_mut().remove_subscriber(subscriber);
    }

    /// Number of effects registered on `(target, key)`.
    pub fn dependent_count(&self, target: TargetId, key: impl Into<Key>) -> usize {
        self.inner
            .graph
            .borrow()
            .dependent_count(target, &key.into())
    }

    /// Whether `subscriber` is registered on `(target, key)`.
    pub fn is_tracked(&self, target: TargetId, key: impl Into<Key>, subscriber: SubscriberId) -> bool {
        self.inner
            .graph
            .borrow()
            .contains(target, &key.into(), subscriber)
    }

    /// Total number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.inner.graph.borrow().edge_count()
    }

    /// Whether two handles refer to the same runtime.
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("edges", &self.edge_count())
            .field("objects", &self.inner.objects.borrow().len())
            .field("lists", &self.inner.lists.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        (count.clone(), count)
    }

    #[test]
    fn memo_tables_drop_dead_wrappers() {
        let runtime = Runtime::new();
        for i in 0..8 {
            let _ = runtime.reactive(Record::from_json(serde_json::json!({ "i": i })));
            let _ = runtime.reactive_list([i].into_iter().collect::<List>());
        }
        assert_eq!(runtime.inner.objects.borrow().len(), 1);
        assert_eq!(runtime.inner.lists.borrow().len(), 1);

        let kept = runtime.reactive_json(serde_json::json!({ "kept": true }));
        let _ = runtime.reactive_json(serde_json::json!({ "dropped": true }));
        assert_eq!(runtime.inner.objects.borrow().len(), 2);
        assert!(kept.raw().contains_key("kept"));
    }

    #[test]
    fn track_without_active_effect_is_noop() {
        let runtime = Runtime::new();
        runtime.track(TargetId::new(), "a");
        assert_eq!(runtime.edge_count(), 0);
    }

    #[test]
    fn trigger_runs_tracked_effect() {
        let runtime = Runtime::new();
        let target = TargetId::new();
        let (runs, sink) = counter();

        let rt = runtime.clone();
        let effect = Effect::new(move || {
            rt.track(target, "a");
            sink.set(sink.get() + 1);
        });

        assert!(runtime.is_tracked(target, "a", effect.id()));
        runtime.trigger(target, "a");
        assert_eq!(runs.get(), 2);

        runtime.trigger(target, "b");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn trigger_runs_dependents_in_registration_order() {
        let runtime = Runtime::new();
        let target = TargetId::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let effects: Vec<_> = (0..3)
            .map(|n| {
                let rt = runtime.clone();
                let order = order.clone();
                Effect::new(move || {
                    rt.track(target, "k");
                    order.borrow_mut().push(n);
                })
            })
            .collect();

        order.borrow_mut().clear();
        runtime.trigger(target, "k");
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert_eq!(effects.len(), 3);
    }

    #[test]
    fn running_effect_is_not_reentered() {
        let runtime = Runtime::new();
        let target = TargetId::new();
        let (runs, sink) = counter();

        let rt = runtime.clone();
        let _effect = Effect::new(move || {
            rt.track(target, "a");
            sink.set(sink.get() + 1);
            rt.trigger(target, "a");
        });

        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn untrack_removes_edges() {
        let runtime = Runtime::new();
        let target = TargetId::new();
        let (runs, sink) = counter();

        let rt = runtime.clone();
        let effect = Effect::new(move || {
            rt.track(target, "a");
            sink.set(sink.get() + 1);
        });

        runtime.untrack(effect.id());
        runtime.trigger(target, "a");
        assert_eq!(runs.get(), 1);
        assert_eq!(runtime.dependent_count(target, "a"), 0);
    }

    #[test]
    fn dropped_effect_is_not_run() {
        let runtime = Runtime::new();
        let target = TargetId::new();
        let (runs, sink) = counter();

        let rt = runtime.clone();
        let effect = Effect::new(move || {
            rt.track(target, "a");
            sink.set(sink.get() + 1);
        });
        drop(effect);

        runtime.trigger(target, "a");
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn reactive_wrappers_are_memoized() {
        let runtime = Runtime::new();
        let record = Record::new();

        let a = runtime.reactive(record.clone());
        let b = runtime.reactive(record);
        assert!(a.ptr_eq(&b));

        let list = List::new();
        let l1 = runtime.reactive_list(list.clone());
        let l2 = runtime.reactive_list(list);
        assert!(l1.ptr_eq(&l2));
    }
}
