//! Host call recording.

use std::cell::RefCell;

use crate::reactive::Value;
use crate::render::{HostNode, HostOps};

/// One call made through [`HostOps`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    CreateElement { tag: String, node: HostNode },
    CreateText { content: String, node: HostNode },
    SetText { node: HostNode, content: String },
    SetElementText { node: HostNode, content: String },
    PatchProp { el: HostNode, key: String, value: Value },
    Insert { child: HostNode, parent: HostNode, anchor: Option<HostNode> },
    ParentNode { node: HostNode, parent: Option<HostNode> },
    QuerySelector { selector: String, node: Option<HostNode> },
}

impl HostCall {
    /// Whether the call changes the host tree.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, HostCall::ParentNode { .. } | HostCall::QuerySelector { .. })
    }
}

/// Wraps a host and records every call made through it.
#[derive(Debug, Default)]
pub struct Recorder<H> {
    inner: H,
    calls: RefCell<Vec<HostCall>>,
}

impl<H: HostOps> Recorder<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// The wrapped host.
    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }

    /// Every call since creation or the last [`clear`](Self::clear).
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Only the calls that changed the host tree.
    pub fn mutations(&self) -> Vec<HostCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| pred(call)).count()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl<H: HostOps> HostOps for Recorder<H> {
    fn create_element(&self, tag: &str) -> HostNode {
        let node = self.inner.create_element(tag);
        self.record(HostCall::CreateElement {
            tag: tag.to_owned(),
            node,
        });
        node
    }

    fn create_text(&self, content: &str) -> HostNode {
        let node = self.inner.create_text(content);
        self.record(HostCall::CreateText {
            content: content.to_owned(),
            node,
        });
        node
    }

    fn set_text(&self, node: HostNode, content: &str) {
        self.record(HostCall::SetText {
            node,
            content: content.to_owned(),
        });
        self.inner.set_text(node, content);
    }

    fn set_element_text(&self, node: HostNode, content: &str) {
        self.record(HostCall::SetElementText {
            node,
            content: content.to_owned(),
        });
        self.inner.set_element_text(node, content);
    }

    fn patch_prop(&self, el: HostNode, key: &str, value: &Value) {
        self.record(HostCall::PatchProp {
            el,
            key: key.to_owned(),
            value: value.clone(),
        });
        self.inner.patch_prop(el, key, value);
    }

    fn insert(&self, child: HostNode, parent: HostNode, anchor: Option<HostNode>) {
        self.record(HostCall::Insert { child, parent, anchor });
        self.inner.insert(child, parent, anchor);
    }

    fn parent_node(&self, node: HostNode) -> Option<HostNode> {
        let parent = self.inner.parent_node(node);
        self.record(HostCall::ParentNode { node, parent });
        parent
    }

    fn query_selector(&self, selector: &str) -> Option<HostNode> {
        let node = self.inner.query_selector(selector);
        self.record(HostCall::QuerySelector {
            selector: selector.to_owned(),
            node,
        });
        node
    }
}
