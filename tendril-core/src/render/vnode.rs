//! Described Nodes
//!
//! A render function produces a tree of [`VNode`]s: plain data describing
//! elements, text and nested components. The renderer compares two such
//! trees and turns the differences into host operations.
//!
//! Render functions may hand back loose children (strings, numbers, nested
//! lists). Before the renderer walks an element's children it flattens them
//! depth-first, left to right, and normalizes every leaf into exactly one
//! `VNode` (a string becomes a text node).

use indexmap::IndexMap;

use super::host::HostNode;
use crate::component::{Component, Instance};
use crate::reactive::Value;

/// Attributes and event listeners of an element, or props of a component.
pub type Props = IndexMap<String, Value>;

/// Build [`Props`] from key/value pairs.
pub fn props<K, V, I>(pairs: I) -> Props
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// What a node describes.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A host element with the given tag. Tags are not validated.
    Element(String),
    /// A text node with the given content.
    Text(String),
    /// A nested component.
    Component(Component),
    /// A placeholder that produces no host nodes.
    Empty,
}

impl NodeKind {
    /// The tag, if this is an element.
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// The content, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// The definition, if this is a component node.
    pub fn as_component(&self) -> Option<&Component> {
        match self {
            NodeKind::Component(component) => Some(component),
            _ => None,
        }
    }

    /// Whether a node of kind `other` can be patched in place of `self`.
    pub fn same_as(&self, other: &NodeKind) -> bool {
        match (self, other) {
            (NodeKind::Element(a), NodeKind::Element(b)) => a == b,
            (NodeKind::Text(_), NodeKind::Text(_)) | (NodeKind::Empty, NodeKind::Empty) => true,
            (NodeKind::Component(a), NodeKind::Component(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<&str> for NodeKind {
    fn from(tag: &str) -> Self {
        NodeKind::Element(tag.to_owned())
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        NodeKind::Element(tag)
    }
}

impl From<Component> for NodeKind {
    fn from(component: Component) -> Self {
        NodeKind::Component(component)
    }
}

impl From<&Component> for NodeKind {
    fn from(component: &Component) -> Self {
        NodeKind::Component(component.clone())
    }
}

/// A child as a render function may return it.
#[derive(Debug, Clone)]
pub enum Child {
    /// An already-built node.
    Node(VNode),
    /// Loose text, normalized into a text node.
    Text(String),
    /// A nested sequence, flattened in place.
    List(Vec<Child>),
}

impl From<VNode> for Child {
    fn from(node: VNode) -> Self {
        Child::Node(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_owned())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<Value> for Child {
    fn from(value: Value) -> Self {
        Child::Text(value.to_string())
    }
}

impl From<f64> for Child {
    fn from(n: f64) -> Self {
        Child::from(Value::from(n))
    }
}

impl From<i32> for Child {
    fn from(n: i32) -> Self {
        Child::from(Value::from(n))
    }
}

impl From<i64> for Child {
    fn from(n: i64) -> Self {
        Child::from(Value::from(n))
    }
}

impl From<usize> for Child {
    fn from(n: usize) -> Self {
        Child::from(Value::from(n))
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Child::List(items.into_iter().map(Into::into).collect())
    }
}

/// The children of an element or component node.
#[derive(Debug, Clone)]
pub enum Children {
    /// Text content, applied with `set_element_text`.
    Text(String),
    /// A sequence of children.
    Nodes(Vec<Child>),
}

impl Default for Children {
    fn default() -> Self {
        Children::Nodes(Vec::new())
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(text.to_owned())
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(text)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Children {
    fn from(items: Vec<T>) -> Self {
        Children::Nodes(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Child>, const N: usize> From<[T; N]> for Children {
    fn from(items: [T; N]) -> Self {
        Children::Nodes(items.into_iter().map(Into::into).collect())
    }
}

/// One described node.
///
/// After the renderer has processed a node it records the host handle in
/// `el` and, for component nodes, the live [`Instance`].
#[derive(Debug, Clone)]
pub struct VNode {
    kind: NodeKind,
    props: Props,
    children: Children,
    pub(crate) el: Option<HostNode>,
    pub(crate) component: Option<Instance>,
}

impl VNode {
    /// Create a node. This is the general constructor behind [`h`].
    pub fn new(kind: impl Into<NodeKind>, props: Props, children: impl Into<Children>) -> Self {
        Self {
            kind: kind.into(),
            props,
            children: children.into(),
            el: None,
            component: None,
        }
    }

    /// An element with no props and no children.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(NodeKind::Element(tag.into()), Props::new(), Children::default())
    }

    /// A text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(content.into()), Props::new(), Children::default())
    }

    /// A component node with the given props.
    pub fn component(component: &Component, props: Props) -> Self {
        Self::new(component, props, Children::default())
    }

    /// A node that renders nothing.
    pub fn empty() -> Self {
        Self::new(NodeKind::Empty, Props::new(), Children::default())
    }

    /// Add or replace a prop.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Append a child. Text children are converted to a node list first.
    pub fn with_child(mut self, child: impl Into<Child>) -> Self {
        match &mut self.children {
            Children::Nodes(children) => children.push(child.into()),
            Children::Text(text) => {
                let text = std::mem::take(text);
                self.children = Children::Nodes(vec![Child::Text(text), child.into()]);
            }
        }
        self
    }

    /// Replace the children.
    pub fn with_children(mut self, children: impl Into<Children>) -> Self {
        self.children = children.into();
        self
    }

    /// What this node describes.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The element tag, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        self.kind.as_tag()
    }

    /// The props of this node.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The children of this node.
    pub fn children(&self) -> &Children {
        &self.children
    }

    /// The host node this node was rendered to, once mounted.
    pub fn el(&self) -> Option<HostNode> {
        self.el
    }

    /// The live component instance, for mounted component nodes.
    pub fn instance(&self) -> Option<&Instance> {
        self.component.as_ref()
    }

    /// Whether `other` can be patched in place of this node.
    pub fn same_kind(&self, other: &VNode) -> bool {
        self.kind.same_as(&other.kind)
    }

    /// A copy without the host handle or instance, safe to store in an
    /// instance without creating a reference cycle.
    pub(crate) fn detached(&self) -> VNode {
        Self {
            kind: self.kind.clone(),
            props: self.props.clone(),
            children: self.children.clone(),
            el: None,
            component: None,
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&NodeKind, &Props, &mut Children) {
        (&self.kind, &self.props, &mut self.children)
    }
}

/// Create a node: `kind` is a tag, a component, or any other [`NodeKind`].
pub fn create_node(kind: impl Into<NodeKind>, props: Props, children: impl Into<Children>) -> VNode {
    VNode::new(kind, props, children)
}

/// Create an element node.
pub fn h(tag: &str, props: Props, children: impl Into<Children>) -> VNode {
    VNode::new(tag, props, children)
}

/// Turn a single child into a node.
///
/// Nodes pass through by value and text becomes a text node. A nested list
/// is not flattened here: it yields an empty node, since flattening is done
/// by [`flatten_children`] before children are walked.
pub fn normalize(child: Child) -> VNode {
    match child {
        Child::Node(node) => node,
        Child::Text(text) => VNode::text(text),
        Child::List(_) => VNode::empty(),
    }
}

/// Flatten nested lists depth-first, left to right, and normalize every
/// leaf, so that afterwards every entry is a [`Child::Node`].
pub fn flatten_children(children: &mut Vec<Child>) {
    if children.iter().all(|child| matches!(child, Child::Node(_))) {
        return;
    }

    fn walk(items: Vec<Child>, out: &mut Vec<Child>) {
        for item in items {
            match item {
                Child::List(nested) => walk(nested, out),
                leaf => out.push(Child::Node(normalize(leaf))),
            }
        }
    }

    let mut flat = Vec::with_capacity(children.len());
    walk(std::mem::take(children), &mut flat);
    *children = flat;
}

/// Iterate over the nodes of a flattened child list.
pub(crate) fn child_nodes_mut(children: &mut [Child]) -> impl Iterator<Item = &mut VNode> {
    children.iter_mut().filter_map(|child| match child {
        Child::Node(node) => Some(node),
        _ => None,
    })
}
