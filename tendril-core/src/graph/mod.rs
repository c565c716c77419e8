//! Dependency Graph
//!
//! This module implements the graph that maps observed properties to the
//! effects that read them.
//!
//! # Overview
//!
//! The graph is a two-level map:
//!
//! - a **target** is an identity-bearing reactive container (a record or a
//!   list), identified by a [`TargetId`];
//! - a **key** is a property of that target (a field name, a list index, or
//!   the list length);
//! - each `(target, key)` pair owns an insertion-ordered set of subscribers.
//!
//! When a property is written, the runtime looks up its set and notifies the
//! live subscribers in registration order.
//!
//! # Design Decisions
//!
//! 1. The graph is owned by a [`Runtime`](crate::reactive::Runtime) instance
//!    rather than living in a global, so two applications on one thread do
//!    not share dependency state.
//!
//! 2. Edges hold weak references. An effect that has been dropped silently
//!    falls out of the graph the next time its key is triggered.
//!
//! 3. Entries are created lazily on first read and are never cleared between
//!    runs, so registration order is stable.

mod deps;
mod target;

pub use deps::DepGraph;
pub use target::{Key, TargetId};
