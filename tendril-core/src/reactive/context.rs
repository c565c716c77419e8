//! Reactive Context
//!
//! The reactive context tracks which effect is currently running. When a
//! reactive object is read, the object asks the context for the current
//! subscriber and records a dependency edge for it.
//!
//! # Implementation
//!
//! We use a thread-local stack. Running an effect pushes it, finishing pops
//! it, so nested effects (a child component mounted from inside its parent's
//! render) restore the outer effect as "current" once they complete. Only the
//! top of the stack is ever active.
//!
//! An entry may also be a barrier with no subscriber, pushed by
//! [`untracked`]. Reads under a barrier record nothing.

use std::cell::RefCell;
use std::rc::Rc;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
#[derive(Clone)]
struct ContextEntry {
    /// The running subscriber, or `None` for an untracked barrier.
    subscriber: Option<Rc<dyn Subscriber>>,
}

impl ContextEntry {
    fn id(&self) -> Option<SubscriberId> {
        self.subscriber.as_ref().map(|s| s.id())
    }
}

/// Guard that pops the context when dropped.
///
/// This keeps the stack balanced even if the computation panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// While the returned guard is alive, reactive reads register the
    /// subscriber as a dependent.
    pub fn enter(subscriber: Rc<dyn Subscriber>) -> Self {
        let subscriber_id = Some(subscriber.id());
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber: Some(subscriber),
            });
        });

        Self { subscriber_id }
    }

    /// Enter a barrier under which no reads are tracked.
    pub fn pause() -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry { subscriber: None });
        });

        Self { subscriber_id: None }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .is_some_and(|entry| entry.subscriber.is_some())
        })
    }

    /// Get the subscriber reads should be attributed to, if any.
    pub fn current_subscriber() -> Option<Rc<dyn Subscriber>> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.subscriber.clone())
        })
    }

    /// Get the ID of the current subscriber, if any.
    pub fn current_id() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(ContextEntry::id))
    }

    /// Depth of the context stack, barriers included.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.id(),
                    self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id,
                    entry.id()
                );
            }
        });
    }
}

/// Run `f` without tracking any reactive reads it performs.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _barrier = ReactiveContext::pause();
    f()
}
