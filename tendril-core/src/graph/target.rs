//! Graph Targets and Keys
//!
//! This module defines how observed properties are addressed in the
//! dependency graph.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identity of a reactive container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    /// Generate a new unique target ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for TargetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A property of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A named field of a record.
    Field(String),

    /// A position in a list.
    Index(usize),

    /// The length of a list.
    Length,
}

impl Key {
    /// Shorthand for [`Key::Field`].
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Field(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => f.write_str(name),
            Key::Index(index) => write!(f, "[{index}]"),
            Key::Length => f.write_str("length"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ids_are_unique() {
        let id1 = TargetId::new();
        let id2 = TargetId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn keys_convert_from_names_and_indices() {
        assert_eq!(Key::from("count"), Key::Field("count".to_string()));
        assert_eq!(Key::from(3usize), Key::Index(3));
        assert_eq!(Key::field(String::from("x")), Key::from("x"));
    }

    #[test]
    fn keys_display_readably() {
        assert_eq!(Key::from("name").to_string(), "name");
        assert_eq!(Key::Index(2).to_string(), "[2]");
        assert_eq!(Key::Length.to_string(), "length");
    }
}
