//! In-Memory Document
//!
//! [`Document`] is a small arena-backed element tree implementing
//! [`HostOps`]. It is the host the runtime is exercised against: it applies
//! attributes and event listeners the way a browser binding would, can
//! dispatch events to listeners, and renders itself to HTML or to a
//! serializable snapshot for assertions.
//!
//! Props whose key is `on` followed by an uppercase letter are event
//! listeners (`onClick` listens for `click`). Every other prop is an
//! attribute: `Null` and `false` remove it, `true` sets it to the empty
//! string, anything else is set to its display form.

mod recorder;

pub use recorder::{HostCall, Recorder};

use std::cell::RefCell;
use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{trace, warn};

use crate::reactive::{Handler, Value};
use crate::render::{HostNode, HostOps};

#[derive(Debug)]
enum Body {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        listeners: IndexMap<String, Handler>,
        children: Vec<HostNode>,
    },
    Text(String),
}

#[derive(Debug)]
struct DomNode {
    parent: Option<HostNode>,
    body: Body,
}

/// A serializable view of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSnapshot {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
        listeners: Vec<String>,
        children: Vec<NodeSnapshot>,
    },
    Text {
        content: String,
    },
}

/// An in-memory element tree.
#[derive(Debug, Default)]
pub struct Document {
    nodes: RefCell<Vec<DomNode>>,
}

/// The event name of a listener prop, if `key` is one. Inverse of
/// [`handler_key`](crate::component::handler_key): `onChangeValue` listens for `change-value`.
fn listener_event(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    if !rest.chars().next()?.is_ascii_uppercase() {
        return None;
    }

    let mut event = String::with_capacity(rest.len() + 2);
    for (i, ch) in rest.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                event.push('-');
            }
            event.extend(ch.to_lowercase());
        } else {
            event.push(ch);
        }
    }
    Some(event)
}

fn escape(text: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, body: Body) -> HostNode {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(DomNode { parent: None, body });
        HostNode::new((nodes.len() - 1) as u64)
    }

    fn index(node: HostNode) -> usize {
        node.raw() as usize
    }

    /// Create a detached `<div id="...">` to mount into.
    pub fn create_root(&self, id: &str) -> HostNode {
        let root = self.create_element("div");
        self.patch_prop(root, "id", &Value::from(id));
        root
    }

    /// Number of nodes ever created.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// The children of an element, in order.
    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        match self.nodes.borrow().get(Self::index(node)).map(|n| &n.body) {
            Some(Body::Element { children, .. }) => children.clone(),
            _ => Vec::new(),
        }
    }

    /// The tag of an element.
    pub fn tag(&self, node: HostNode) -> Option<String> {
        match self.nodes.borrow().get(Self::index(node)).map(|n| &n.body) {
            Some(Body::Element { tag, .. }) => Some(tag.clone()),
            _ => None,
        }
    }

    /// The value of an attribute.
    pub fn attribute(&self, node: HostNode, name: &str) -> Option<String> {
        match self.nodes.borrow().get(Self::index(node)).map(|n| &n.body) {
            Some(Body::Element { attributes, .. }) => attributes.get(name).cloned(),
            _ => None,
        }
    }

    /// Whether an element listens for `event`.
    pub fn has_listener(&self, node: HostNode, event: &str) -> bool {
        match self.nodes.borrow().get(Self::index(node)).map(|n| &n.body) {
            Some(Body::Element { listeners, .. }) => listeners.contains_key(event),
            _ => false,
        }
    }

    /// The concatenated text of a subtree.
    pub fn text_content(&self, node: HostNode) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: HostNode, out: &mut String) {
        let children = {
            let nodes = self.nodes.borrow();
            match nodes.get(Self::index(node)).map(|n| &n.body) {
                Some(Body::Text(content)) => {
                    out.push_str(content);
                    return;
                }
                Some(Body::Element { children, .. }) => children.clone(),
                None => return,
            }
        };
        for child in children {
            self.collect_text(child, out);
        }
    }

    /// The first element with the given tag, in creation order.
    pub fn find_by_tag(&self, tag: &str) -> Option<HostNode> {
        self.find(|body| matches!(body, Body::Element { tag: t, .. } if t == tag))
    }

    fn find(&self, pred: impl Fn(&Body) -> bool) -> Option<HostNode> {
        self.nodes
            .borrow()
            .iter()
            .position(|node| pred(&node.body))
            .map(|index| HostNode::new(index as u64))
    }

    /// Fire the listener for `event` on `node` with `args`.
    ///
    /// Returns `false` if the node does not listen for it.
    pub fn dispatch(&self, node: HostNode, event: &str, args: &[Value]) -> bool {
        let handler = match self.nodes.borrow().get(Self::index(node)).map(|n| &n.body) {
            Some(Body::Element { listeners, .. }) => listeners.get(event).cloned(),
            _ => None,
        };

        match handler {
            Some(handler) => {
                trace!(%node, event, "dispatch");
                handler.call(args);
                true
            }
            None => false,
        }
    }

    /// Render a subtree as HTML.
    pub fn to_html(&self, node: HostNode) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: HostNode, out: &mut String) {
        let (tag, children) = {
            let nodes = self.nodes.borrow();
            match nodes.get(Self::index(node)).map(|n| &n.body) {
                Some(Body::Text(content)) => {
                    out.push_str(&escape(content, false));
                    return;
                }
                Some(Body::Element {
                    tag,
                    attributes,
                    children,
                    ..
                }) => {
                    out.push('<');
                    out.push_str(tag);
                    for (name, value) in attributes {
                        let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
                    }
                    out.push('>');
                    (tag.clone(), children.clone())
                }
                None => return,
            }
        };

        for child in children {
            self.write_html(child, out);
        }
        let _ = write!(out, "</{tag}>");
    }

    /// A serializable snapshot of a subtree.
    pub fn snapshot(&self, node: HostNode) -> Option<NodeSnapshot> {
        let (snapshot, children) = {
            let nodes = self.nodes.borrow();
            match &nodes.get(Self::index(node))?.body {
                Body::Text(content) => {
                    return Some(NodeSnapshot::Text {
                        content: content.clone(),
                    })
                }
                Body::Element {
                    tag,
                    attributes,
                    listeners,
                    children,
                } => (
                    (tag.clone(), attributes.clone(), listeners.keys().cloned().collect()),
                    children.clone(),
                ),
            }
        };

        let (tag, attributes, listeners) = snapshot;
        Some(NodeSnapshot::Element {
            tag,
            attributes,
            listeners,
            children: children.into_iter().filter_map(|child| self.snapshot(child)).collect(),
        })
    }

    /// Remove `node` from its parent's child list.
    fn detach(nodes: &mut [DomNode], node: HostNode) {
        let Some(parent) = nodes.get_mut(Self::index(node)).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(Body::Element { children, .. }) = nodes.get_mut(Self::index(parent)).map(|n| &mut n.body) {
            children.retain(|child| *child != node);
        }
    }
}

impl HostOps for Document {
    fn create_element(&self, tag: &str) -> HostNode {
        self.push(Body::Element {
            tag: tag.to_owned(),
            attributes: IndexMap::new(),
            listeners: IndexMap::new(),
            children: Vec::new(),
        })
    }

    fn create_text(&self, content: &str) -> HostNode {
        self.push(Body::Text(content.to_owned()))
    }

    fn set_text(&self, node: HostNode, content: &str) {
        match self.nodes.borrow_mut().get_mut(Self::index(node)).map(|n| &mut n.body) {
            Some(Body::Text(text)) => *text = content.to_owned(),
            _ => warn!(%node, "set_text on a node that is not a text node"),
        }
    }

    fn set_element_text(&self, node: HostNode, content: &str) {
        let text = (!content.is_empty()).then(|| self.create_text(content));

        let mut nodes = self.nodes.borrow_mut();
        let old_children = match nodes.get_mut(Self::index(node)).map(|n| &mut n.body) {
            Some(Body::Element { children, .. }) => std::mem::take(children),
            _ => {
                warn!(%node, "set_element_text on a node that is not an element");
                return;
            }
        };
        for child in old_children {
            if let Some(child) = nodes.get_mut(Self::index(child)) {
                child.parent = None;
            }
        }
        if let Some(text) = text {
            if let Some(Body::Element { children, .. }) = nodes.get_mut(Self::index(node)).map(|n| &mut n.body) {
                children.push(text);
            }
            if let Some(text) = nodes.get_mut(Self::index(text)) {
                text.parent = Some(node);
            }
        }
    }

    fn patch_prop(&self, el: HostNode, key: &str, value: &Value) {
        let mut nodes = self.nodes.borrow_mut();
        let Some(Body::Element {
            attributes, listeners, ..
        }) = nodes.get_mut(Self::index(el)).map(|n| &mut n.body)
        else {
            warn!(%el, key, "patch_prop on a node that is not an element");
            return;
        };

        if let Some(event) = listener_event(key) {
            match value.as_handler() {
                Some(handler) => {
                    listeners.insert(event, handler.clone());
                }
                None => {
                    listeners.shift_remove(&event);
                }
            }
            return;
        }

        match value {
            Value::Null | Value::Bool(false) => {
                attributes.shift_remove(key);
            }
            Value::Bool(true) => {
                attributes.insert(key.to_owned(), String::new());
            }
            other => {
                attributes.insert(key.to_owned(), other.to_string());
            }
        }
    }

    fn insert(&self, child: HostNode, parent: HostNode, anchor: Option<HostNode>) {
        let mut nodes = self.nodes.borrow_mut();
        if nodes.get(Self::index(child)).is_none() {
            warn!(%child, "insert of an unknown node");
            return;
        }
        Self::detach(&mut nodes, child);

        let Some(Body::Element { children, .. }) = nodes.get_mut(Self::index(parent)).map(|n| &mut n.body) else {
            warn!(%parent, "insert into a node that is not an element");
            return;
        };
        let position = anchor
            .and_then(|anchor| children.iter().position(|c| *c == anchor))
            .unwrap_or(children.len());
        children.insert(position, child);

        if let Some(node) = nodes.get_mut(Self::index(child)) {
            node.parent = Some(parent);
        }
    }

    fn parent_node(&self, node: HostNode) -> Option<HostNode> {
        self.nodes.borrow().get(Self::index(node)).and_then(|n| n.parent)
    }

    fn query_selector(&self, selector: &str) -> Option<HostNode> {
        let selector = selector.trim();
        match selector.strip_prefix('#') {
            Some(id) => self.find(|body| {
                matches!(body, Body::Element { attributes, .. } if attributes.get("id").is_some_and(|v| v == id))
            }),
            None => self.find_by_tag(selector),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn insert_appends_and_respects_anchor() {
        let doc = Document::new();
        let root = doc.create_root("app");
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");

        doc.insert(a, root, None);
        doc.insert(c, root, None);
        doc.insert(b, root, Some(c));

        assert_eq!(doc.children(root), vec![a, b, c]);
        assert_eq!(doc.parent_node(b), Some(root));
        assert_eq!(doc.parent_node(root), None);
    }

    #[test]
    fn insert_moves_attached_node() {
        let doc = Document::new();
        let first = doc.create_element("div");
        let second = doc.create_element("div");
        let child = doc.create_text("x");

        doc.insert(child, first, None);
        doc.insert(child, second, None);

        assert!(doc.children(first).is_empty());
        assert_eq!(doc.children(second), vec![child]);
    }

    #[test]
    fn attributes_follow_value_rules() {
        let doc = Document::new();
        let el = doc.create_element("input");

        doc.patch_prop(el, "value", &Value::from(3));
        doc.patch_prop(el, "disabled", &Value::Bool(true));
        assert_eq!(doc.attribute(el, "value").as_deref(), Some("3"));
        assert_eq!(doc.attribute(el, "disabled").as_deref(), Some(""));

        doc.patch_prop(el, "disabled", &Value::Bool(false));
        doc.patch_prop(el, "value", &Value::Null);
        assert_eq!(doc.attribute(el, "disabled"), None);
        assert_eq!(doc.attribute(el, "value"), None);
    }

    #[test]
    fn listener_props_register_events() {
        let doc = Document::new();
        let el = doc.create_element("button");
        let clicks = Rc::new(Cell::new(0));
        let sink = clicks.clone();

        doc.patch_prop(el, "onClick", &Value::from(Handler::new(move |_| sink.set(sink.get() + 1))));
        doc.patch_prop(el, "online", &Value::from("yes"));

        assert!(doc.has_listener(el, "click"));
        assert_eq!(doc.attribute(el, "online").as_deref(), Some("yes"));
        assert!(doc.dispatch(el, "click", &[]));
        assert!(!doc.dispatch(el, "hover", &[]));
        assert_eq!(clicks.get(), 1);

        doc.patch_prop(el, "onClick", &Value::Null);
        assert!(!doc.has_listener(el, "click"));
    }

    #[test]
    fn multi_word_listener_matches_emitted_event_name() {
        let doc = Document::new();
        let el = doc.create_element("input");
        let key = crate::component::handler_key("change-value");

        doc.patch_prop(el, &key, &Value::from(Handler::new(|_| {})));

        assert_eq!(listener_event(&key).as_deref(), Some("change-value"));
        assert!(doc.has_listener(el, "change-value"));
        assert!(!doc.has_listener(el, "changevalue"));
    }

    #[test]
    fn set_element_text_replaces_children() {
        let doc = Document::new();
        let el = doc.create_element("p");
        let old = doc.create_element("span");
        doc.insert(old, el, None);

        doc.set_element_text(el, "hello");
        assert_eq!(doc.text_content(el), "hello");
        assert_eq!(doc.parent_node(old), None);

        doc.set_element_text(el, "");
        assert!(doc.children(el).is_empty());
    }

    #[test]
    fn query_selector_by_id_and_tag() {
        let doc = Document::new();
        let root = doc.create_root("app");
        let section = doc.create_element("section");
        doc.insert(section, root, None);

        assert_eq!(doc.query_selector("#app"), Some(root));
        assert_eq!(doc.query_selector("section"), Some(section));
        assert_eq!(doc.query_selector("#missing"), None);
    }

    #[test]
    fn html_and_snapshot() {
        let doc = Document::new();
        let root = doc.create_root("app");
        let p = doc.create_element("p");
        doc.patch_prop(p, "title", &Value::from("a \"quote\""));
        doc.insert(p, root, None);
        let text = doc.create_text("1 < 2");
        doc.insert(text, p, None);

        assert_eq!(
            doc.to_html(root),
            "<div id=\"app\"><p title=\"a &quot;quote&quot;\">1 &lt; 2</p></div>"
        );

        let json = serde_json::to_value(doc.snapshot(root)).expect("serialize");
        assert_eq!(json["type"], "element");
        assert_eq!(json["children"][0]["tag"], "p");
        assert_eq!(json["children"][0]["children"][0]["content"], "1 < 2");
    }
}
