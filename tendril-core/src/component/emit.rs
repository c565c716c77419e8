//! Component events.
//!
//! A component emits `"change"` by calling the `onChange` prop its parent
//! passed, if any. Listener props are read from the raw props of the
//! component node, not from the declared props, so they never need to be
//! declared.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::reactive::Value;
use crate::render::Props;

/// The listener prop name for an event: `on` + the camel-cased event name
/// with its first letter capitalized (`"change-value"` → `"onChangeValue"`).
pub fn handler_key(event: &str) -> String {
    let mut key = String::with_capacity(event.len() + 2);
    key.push_str("on");

    let mut upper = true;
    for ch in event.chars() {
        if ch == '-' {
            upper = true;
            continue;
        }
        if upper {
            key.extend(ch.to_uppercase());
            upper = false;
        } else {
            key.push(ch);
        }
    }
    key
}

/// The emit capability bound to one component instance.
#[derive(Clone, Default)]
pub struct Emitter {
    listeners: Rc<RefCell<Props>>,
}

impl Emitter {
    pub(crate) fn new(props: Props) -> Self {
        Self {
            listeners: Rc::new(RefCell::new(props)),
        }
    }

    /// Point the emitter at the props of a newer component node.
    pub(crate) fn replace(&self, props: Props) {
        *self.listeners.borrow_mut() = props;
    }

    /// Invoke the listener for `event` with `args`.
    ///
    /// Returns `false` when no listener was supplied.
    pub fn emit(&self, event: &str, args: &[Value]) -> bool {
        let key = handler_key(event);
        let handler = self
            .listeners
            .borrow()
            .get(&key)
            .and_then(Value::as_handler)
            .cloned();

        match handler {
            Some(handler) => {
                trace!(event, %key, "emit");
                handler.call(args);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: Vec<String> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, value)| value.as_handler().is_some())
            .map(|(key, _)| key.clone())
            .collect();
        f.debug_struct("Emitter").field("listeners", &listeners).finish()
    }
}
