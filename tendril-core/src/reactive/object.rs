//! Reactive Wrappers
//!
//! A [`Reactive`] wraps a [`Record`] so every field read tracks and every
//! field write triggers; [`ReactiveList`] does the same for a [`List`].
//!
//! # How Wrappers Work
//!
//! 1. `get(key)` records `(record, key)` against the running effect, then
//!    returns a clone of the stored value.
//!
//! 2. `set(key, value)` stores the value and, only if it differs from what
//!    was stored before, triggers every effect that read `(record, key)`.
//!
//! 3. Nested records and lists are not wrapped up front. [`Reactive::object`]
//!    and [`Reactive::list`] wrap them on first access through the runtime,
//!    which memoizes wrappers per container identity.
//!
//! For lists, an index write triggers only that index. Appending triggers the
//! new index and [`Key::Length`].

use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::runtime::Runtime;
use super::value::{List, Record, Value};
use crate::graph::{Key, TargetId};

pub(crate) struct ObjectInner {
    raw: Record,
    runtime: Runtime,
}

/// A tracked view of a record.
#[derive(Clone)]
pub struct Reactive {
    inner: Rc<ObjectInner>,
}

impl Reactive {
    pub(crate) fn wrap(raw: Record, runtime: Runtime) -> Self {
        Self {
            inner: Rc::new(ObjectInner { raw, runtime }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ObjectInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<ObjectInner> {
        &self.inner
    }

    /// Read a field, tracking it. Missing fields read as [`Value::Null`].
    pub fn get(&self, key: &str) -> Value {
        self.track(key);
        self.inner.raw.get(key).unwrap_or_default()
    }

    /// Read a field without tracking it.
    pub fn get_untracked(&self, key: &str) -> Value {
        self.inner.raw.get(key).unwrap_or_default()
    }

    /// Whether a field is present, tracking it.
    pub fn has(&self, key: &str) -> bool {
        self.track(key);
        self.inner.raw.contains_key(key)
    }

    /// Read a nested record as a reactive wrapper, tracking the field.
    pub fn object(&self, key: &str) -> Option<Reactive> {
        match self.get(key) {
            Value::Record(record) => Some(self.inner.runtime.reactive(record)),
            _ => None,
        }
    }

    /// Read a nested list as a reactive wrapper, tracking the field.
    pub fn list(&self, key: &str) -> Option<ReactiveList> {
        match self.get(key) {
            Value::List(list) => Some(self.inner.runtime.reactive_list(list)),
            _ => None,
        }
    }

    /// Write a field. Returns `true` if the value changed and dependents ran.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let changed = match self.inner.raw.insert(key, value.clone()) {
            Some(previous) => previous != value,
            None => true,
        };

        if changed {
            self.inner.runtime.trigger(self.id(), key);
        }
        changed
    }

    /// Compute a new value from the current one (untracked) and write it.
    pub fn update(&self, key: &str, f: impl FnOnce(&Value) -> Value) -> bool {
        let next = f(&self.get_untracked(key));
        self.set(key, next)
    }

    /// Remove a field, triggering its dependents if it was present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let previous = self.inner.raw.remove(key)?;
        self.inner.runtime.trigger(self.id(), key);
        Some(previous)
    }

    /// Field names, untracked.
    pub fn keys(&self) -> Vec<String> {
        self.inner.raw.keys()
    }

    /// The wrapped record.
    pub fn raw(&self) -> &Record {
        &self.inner.raw
    }

    /// Identity of the wrapped record.
    pub fn id(&self) -> TargetId {
        self.inner.raw.id()
    }

    /// The runtime this wrapper reports to.
    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Whether two handles are the same wrapper.
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn track(&self, key: &str) {
        self.inner.runtime.track(self.id(), Key::from(key));
    }
}

impl From<Reactive> for Value {
    fn from(reactive: Reactive) -> Self {
        Value::Record(reactive.inner.raw.clone())
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&self.inner.raw).finish()
    }
}

pub(crate) struct ListInner {
    raw: List,
    runtime: Runtime,
}

/// A tracked view of a list.
#[derive(Clone)]
pub struct ReactiveList {
    inner: Rc<ListInner>,
}

impl ReactiveList {
    pub(crate) fn wrap(raw: List, runtime: Runtime) -> Self {
        Self {
            inner: Rc::new(ListInner { raw, runtime }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ListInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<ListInner> {
        &self.inner
    }

    /// Read an item, tracking its index. Out of range reads as [`Value::Null`].
    pub fn get(&self, index: usize) -> Value {
        self.inner.runtime.track(self.id(), Key::Index(index));
        self.inner.raw.get(index).unwrap_or_default()
    }

    /// Number of items, tracking the length.
    pub fn len(&self) -> usize {
        self.inner.runtime.track(self.id(), Key::Length);
        self.inner.raw.len()
    }

    /// Whether the list is empty, tracking the length.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write an item. Writing at `len` appends; writing past it is ignored.
    ///
    /// Returns `true` if anything changed.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> bool {
        let value = value.into();
        let len = self.inner.raw.len();
        if index == len {
            self.push(value);
            return true;
        }
        if index > len {
            warn!(list = self.id().raw(), index, len, "ignoring write past end of list");
            return false;
        }

        let changed = self
            .inner
            .raw
            .replace(index, value.clone())
            .is_some_and(|previous| previous != value);
        if changed {
            self.inner.runtime.trigger(self.id(), Key::Index(index));
        }
        changed
    }

    /// Append an item, triggering its index and the length.
    pub fn push(&self, value: impl Into<Value>) {
        let index = self.inner.raw.push(value);
        self.inner.runtime.trigger(self.id(), Key::Index(index));
        self.inner.runtime.trigger(self.id(), Key::Length);
    }

    /// Snapshot of the items, tracking the length and every index.
    pub fn to_vec(&self) -> Vec<Value> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }

    /// The wrapped list.
    pub fn raw(&self) -> &List {
        &self.inner.raw
    }

    /// Identity of the wrapped list.
    pub fn id(&self) -> TargetId {
        self.inner.raw.id()
    }

    /// Whether two handles are the same wrapper.
    pub fn ptr_eq(&self, other: &ReactiveList) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<ReactiveList> for Value {
    fn from(list: ReactiveList) -> Self {
        Value::List(list.inner.raw.clone())
    }
}

impl fmt::Debug for ReactiveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReactiveList").field(&self.inner.raw).finish()
    }
}
