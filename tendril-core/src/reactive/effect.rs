//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever a
//! reactive value it read is written.
//!
//! # How Effects Work
//!
//! 1. Running an effect makes it the current subscriber on the reactive
//!    context stack. Every reactive read performed during the run records a
//!    `(target, key) -> effect` edge in the runtime's dependency graph.
//!
//! 2. A write to a tracked `(target, key)` notifies the effect, which runs
//!    again immediately. There is no queue and no batching.
//!
//! 3. While an effect is running it is skipped by notifications, so an
//!    effect that writes a key it also reads does not recurse into itself.
//!
//! Edges are never cleared between runs: dependents of a key keep the order
//! in which they first registered.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::context::ReactiveContext;
use super::subscriber::{Subscriber, SubscriberId};

/// A side-effecting computation that runs when dependencies change.
///
/// `R` is the value returned by [`Effect::run`]. Notification-driven runs
/// discard it.
///
/// # Example
///
/// ```rust,ignore
/// let state = runtime.reactive_json(json!({ "count": 0 }));
///
/// let effect = Effect::new({
///     let state = state.clone();
///     move || println!("count is {}", state.get("count"))
/// });
///
/// state.set("count", 5); // prints "count is 5"
/// ```
pub struct Effect<R: 'static = ()> {
    inner: Rc<EffectInner<R>>,
}

struct EffectInner<R> {
    /// The subscriber ID used for dependency tracking.
    id: SubscriberId,

    /// The effect function.
    func: Box<dyn Fn() -> R>,

    /// Set while the function is executing.
    running: Cell<bool>,

    /// Whether the effect has been disposed.
    disposed: Cell<bool>,

    /// Number of times the effect has run.
    run_count: Cell<usize>,

    /// Identifier of the component instance that owns this effect, if any.
    owner: Cell<Option<u64>>,
}

/// Restores the `running` flag even if the effect function panics.
struct RunGuard<'a> {
    running: &'a Cell<bool>,
    previous: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.set(self.previous);
    }
}

impl<R: 'static> EffectInner<R> {
    fn execute(this: &Rc<Self>) -> R {
        let _guard = RunGuard {
            running: &this.running,
            previous: this.running.replace(true),
        };
        let _ctx = ReactiveContext::enter(Rc::clone(this) as Rc<dyn Subscriber>);

        let result = (this.func)();
        this.run_count.set(this.run_count.get() + 1);
        result
    }
}

impl<R: 'static> Subscriber for EffectInner<R> {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn notify(self: Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        let _ = EffectInner::execute(&self);
    }
}

impl<R: 'static> Effect<R> {
    /// Create a new effect and run it immediately to establish dependencies.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() -> R + 'static,
    {
        let effect = Self::new_lazy(func);
        let _ = effect.run();
        effect
    }

    /// Create a new effect without running it.
    ///
    /// Component render effects are created this way so the first run can
    /// report its result to the caller of mount.
    pub fn new_lazy<F>(func: F) -> Self
    where
        F: Fn() -> R + 'static,
    {
        Self {
            inner: Rc::new(EffectInner {
                id: SubscriberId::new(),
                func: Box::new(func),
                running: Cell::new(false),
                disposed: Cell::new(false),
                run_count: Cell::new(0),
                owner: Cell::new(None),
            }),
        }
    }

    /// Get the subscriber ID for this effect.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Run the effect as the active computation and return its result.
    ///
    /// The previously active effect is restored afterwards, so effects nest.
    /// An explicit run ignores disposal; only notifications respect it.
    pub fn run(&self) -> R {
        EffectInner::execute(&self.inner)
    }

    /// Re-run the effect unless it has been disposed.
    pub fn schedule(&self) {
        Rc::clone(&self.inner).notify();
    }

    /// Dispose of the effect. Notifications no longer run it.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Check if the effect is executing right now.
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Record the component instance that owns this effect.
    pub fn set_owner(&self, owner: u64) {
        self.inner.owner.set(Some(owner));
    }

    /// The owning component instance, if any.
    pub fn owner(&self) -> Option<u64> {
        self.inner.owner.get()
    }
}

impl<R: 'static> Clone for Effect<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: 'static> fmt::Debug for Effect<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("running", &self.is_running())
            .field("disposed", &self.is_disposed())
            .field("owner", &self.owner())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
