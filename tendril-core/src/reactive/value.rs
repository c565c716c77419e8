//! Plain Data
//!
//! `Value` is the dynamic data model shared by reactive state, component
//! props and host attributes. Structured values (`Record`, `List`) are
//! shared, identity-bearing containers: cloning a `Value::Record` clones the
//! handle, not the fields, and every container carries the [`TargetId`]
//! under which the dependency graph observes it.
//!
//! Containers are plain: reading or writing them directly tracks nothing.
//! Reactivity comes from wrapping them with
//! [`Runtime::reactive`](super::Runtime::reactive).
//!
//! Equality is by identity for records, lists and handlers and by value for
//! everything else. A reactive write only triggers when the stored value is
//! not equal to the new one.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::graph::TargetId;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    Str(String),
    /// A shared record of named fields.
    Record(Record),
    /// A shared list.
    List(List),
    /// A callback, typically an event listener.
    Handler(Handler),
}

impl Value {
    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The record handle, if this is a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The list handle, if this is a list.
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// The handler, if this is a handler.
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    /// Convert to JSON. Handlers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Handler(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => match integral(*n) {
                Some(i) => serde_json::Value::from(i),
                None => serde_json::Number::from_f64(*n)
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
            },
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Record(record) => record.to_json(),
            Value::List(list) => list.to_json(),
        }
    }
}

/// The value as an integer when it has no fractional part and fits exactly.
fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15).then_some(n as i64)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Handler(a), Value::Handler(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Record(record) => write!(f, "Record#{}", record.id().raw()),
            Value::List(list) => write!(f, "List#{}", list.id().raw()),
            Value::Handler(_) => f.write_str("Handler"),
        }
    }
}

/// Text interpolation format: `null` renders empty, integral numbers render
/// without a fractional part, containers render as JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => match integral(*n) {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{n}"),
            },
            Value::Str(s) => f.write_str(s),
            Value::Record(_) | Value::List(_) => write!(f, "{}", self.to_json()),
            Value::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Handler(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Value::Str(s) => serializer.serialize_str(s),
            Value::Record(record) => {
                let fields = record.0.fields.borrow();
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::List(list) => {
                let items = list.0.items.borrow();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::List(list)
    }
}

impl From<Handler> for Value {
    fn from(handler: Handler) -> Self {
        Value::Handler(handler)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(List::from_iter(items.into_iter().map(Value::from)))
            }
            serde_json::Value::Object(fields) => Value::Record(Record::from_iter(
                fields.into_iter().map(|(key, value)| (key, Value::from(value))),
            )),
        }
    }
}

struct RecordInner {
    id: TargetId,
    fields: RefCell<IndexMap<String, Value>>,
}

/// A shared, identity-bearing map of named fields.
#[derive(Clone)]
pub struct Record(Rc<RecordInner>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::from_fields(IndexMap::new())
    }

    fn from_fields(fields: IndexMap<String, Value>) -> Self {
        Self(Rc::new(RecordInner {
            id: TargetId::new(),
            fields: RefCell::new(fields),
        }))
    }

    /// Build a record from a JSON object. Non-object JSON yields an empty record.
    pub fn from_json(json: serde_json::Value) -> Self {
        match Value::from(json) {
            Value::Record(record) => record,
            _ => Self::new(),
        }
    }

    /// The identity under which this record is observed.
    pub fn id(&self) -> TargetId {
        self.0.id
    }

    /// Read a field without tracking.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.fields.borrow().get(key).cloned()
    }

    /// Whether a field is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.fields.borrow().contains_key(key)
    }

    /// Write a field without triggering, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.fields.borrow_mut().insert(key.into(), value.into())
    }

    /// Remove a field without triggering, returning the previous value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.fields.borrow_mut().shift_remove(key)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.fields.borrow().keys().cloned().collect()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.fields.borrow().len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.fields.borrow().is_empty()
    }

    /// Whether two handles refer to the same record.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Convert to a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .fields
                .borrow()
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_fields(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id())
            .field("fields", &*self.0.fields.borrow())
            .finish()
    }
}

struct ListInner {
    id: TargetId,
    items: RefCell<Vec<Value>>,
}

/// A shared, identity-bearing list of values.
#[derive(Clone)]
pub struct List(Rc<ListInner>);

impl List {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    fn from_items(items: Vec<Value>) -> Self {
        Self(Rc::new(ListInner {
            id: TargetId::new(),
            items: RefCell::new(items),
        }))
    }

    /// The identity under which this list is observed.
    pub fn id(&self) -> TargetId {
        self.0.id
    }

    /// Read an item without tracking.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.items.borrow().get(index).cloned()
    }

    /// Overwrite an existing item without triggering, returning the previous
    /// value. Returns `None` and changes nothing when out of range.
    pub fn replace(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let mut items = self.0.items.borrow_mut();
        let slot = items.get_mut(index)?;
        Some(std::mem::replace(slot, value.into()))
    }

    /// Append without triggering, returning the new item's index.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        let mut items = self.0.items.borrow_mut();
        items.push(value.into());
        items.len() - 1
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.items.borrow().len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.items.borrow().is_empty()
    }

    /// Snapshot of the items.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    /// Whether two handles refer to the same list.
    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Convert to a JSON array.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.0.items.borrow().iter().map(Value::to_json).collect())
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Into<Value>> FromIterator<V> for List {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("id", &self.id())
            .field("items", &*self.0.items.borrow())
            .finish()
    }
}

/// A shared callback taking positional arguments.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&[Value])>);

impl Handler {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) + 'static,
    {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, args: &[Value]) {
        (self.0)(args);
    }

    /// Whether two handles refer to the same callback.
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn scalars_compare_by_value() {
        assert_eq!(Value::from(1), Value::Number(1.0));
        assert_eq!(Value::from("a"), Value::from(String::from("a")));
        assert_ne!(Value::from(true), Value::from(1));
        assert_eq!(Value::Null, Value::from(None::<i32>));
    }

    #[test]
    fn nan_equals_nan() {
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_ne!(Value::from(f64::NAN), Value::from(0.0));
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = Record::from_iter([("x", 1)]);
        let b = Record::from_iter([("x", 1)]);

        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));

        let h = Handler::new(|_| {});
        assert_eq!(Value::from(h.clone()), Value::from(h));
        assert_ne!(
            Value::from(Handler::new(|_| {})),
            Value::from(Handler::new(|_| {}))
        );
    }

    #[test]
    fn display_matches_interpolation_rules() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(3).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::from(false).to_string(), "false");
        assert_eq!(
            Value::from(json!({ "a": [1, 2] })).to_string(),
            r#"{"a":[1,2]}"#
        );
    }

    #[test]
    fn json_conversion_builds_nested_containers() {
        let value = Value::from(json!({ "user": { "name": "ada" }, "tags": ["x"] }));
        let record = value.as_record().expect("record");

        let user = record.get("user").expect("user");
        assert_eq!(
            user.as_record().and_then(|u| u.get("name")),
            Some(Value::from("ada"))
        );
        assert_eq!(record.get("tags").and_then(|t| t.as_list().map(List::len)), Some(1));
    }

    #[test]
    fn serialize_round_trips_through_json() {
        let record = Record::from_json(json!({ "count": 2, "label": "x" }));
        let text = serde_json::to_string(&Value::from(record)).expect("serialize");
        assert_eq!(text, r#"{"count":2,"label":"x"}"#);
    }

    #[test]
    fn record_insert_reports_previous_value() {
        let record = Record::new();
        assert!(record.insert("a", 1).is_none());
        assert_eq!(record.insert("a", 2), Some(Value::from(1)));
        assert_eq!(record.keys(), vec!["a".to_string()]);
        assert_eq!(record.remove("a"), Some(Value::from(2)));
        assert!(record.is_empty());
    }

    #[test]
    fn list_replace_is_bounded() {
        let list = List::from_iter([1, 2]);
        assert_eq!(list.replace(1, 5), Some(Value::from(2)));
        assert_eq!(list.replace(2, 9), None);
        assert_eq!(list.push(3), 2);
        assert_eq!(list.to_vec(), vec![Value::from(1), Value::from(5), Value::from(3)]);
    }

    #[test]
    fn handler_receives_arguments() {
        let total = Rc::new(Cell::new(0.0));
        let sink = total.clone();
        let handler = Handler::new(move |args| {
            sink.set(args.iter().filter_map(Value::as_f64).sum());
        });

        handler.call(&[Value::from(2), Value::from(3)]);
        assert_eq!(total.get(), 5.0);
    }
}
