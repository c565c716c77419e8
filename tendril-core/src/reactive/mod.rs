//! Reactive Primitives
//!
//! This module implements the reactivity engine: reactive records and lists,
//! effects, and the runtime that connects them.
//!
//! # Concepts
//!
//! ## Reactive objects
//!
//! A [`Reactive`] wraps a plain [`Record`]. Reading a field while an effect
//! is running registers the effect as a dependent of `(record, field)`.
//! Writing a field with a different value runs every dependent.
//!
//! ## Effects
//!
//! An [`Effect`] is a computation that re-runs whenever something it read is
//! written. Component rendering is an effect: the render function reads
//! props and state, and any write to them re-renders the component.
//!
//! # Implementation Notes
//!
//! The active effect lives on a thread-local stack (see [`ReactiveContext`]),
//! while the dependency graph is owned by a [`Runtime`] handle that every
//! wrapper carries. Everything is single-threaded and synchronous: a write
//! returns only after all its dependents have finished running.

mod context;
mod effect;
mod object;
mod runtime;
mod subscriber;
mod value;

pub use context::{untracked, ReactiveContext};
pub use effect::Effect;
pub use object::{Reactive, ReactiveList};
pub use runtime::Runtime;
pub use subscriber::{Subscriber, SubscriberId};
pub use value::{Handler, List, Record, Value};
