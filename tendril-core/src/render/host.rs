//! Host Operations
//!
//! The renderer never touches a concrete display tree. Everything it does to
//! the host goes through [`HostOps`], and the only thing it keeps from the
//! host is the opaque [`HostNode`] handle each operation hands back.

use std::fmt;

use serde::Serialize;

use crate::reactive::Value;

/// Opaque handle to a node owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HostNode(u64);

impl HostNode {
    /// Wrap a host-assigned identifier.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The operations a host binding must provide.
///
/// Every operation except [`query_selector`](HostOps::query_selector) is
/// required.
pub trait HostOps {
    /// Create a detached element.
    fn create_element(&self, tag: &str) -> HostNode;

    /// Create a detached text node.
    fn create_text(&self, content: &str) -> HostNode;

    /// Replace the content of a text node.
    fn set_text(&self, node: HostNode, content: &str);

    /// Replace all children of an element with the given text.
    fn set_element_text(&self, node: HostNode, content: &str);

    /// Apply one attribute or event listener to an element.
    fn patch_prop(&self, el: HostNode, key: &str, value: &Value);

    /// Insert `child` into `parent`, before `anchor` if given, else last.
    fn insert(&self, child: HostNode, parent: HostNode, anchor: Option<HostNode>);

    /// The parent of a node, if it is attached.
    fn parent_node(&self, node: HostNode) -> Option<HostNode>;

    /// Resolve a selector to a node. Hosts without selectors return `None`.
    fn query_selector(&self, _selector: &str) -> Option<HostNode> {
        None
    }
}
