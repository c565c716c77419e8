//! Render function generation.
//!
//! The generated function walks the parsed tree on every call and resolves
//! bindings against the [`RenderContext`], so every path it reads is tracked
//! by the component's render effect.

use std::rc::Rc;

use tracing::warn;

use super::parse::{Attribute, TemplateNode};
use super::CompileError;
use crate::component::{handler_key, RenderContext, RenderFn};
use crate::reactive::Value;
use crate::render::{Child, Props, VNode};

/// Build the render function for parsed roots. Only the first root is
/// rendered.
pub(crate) fn generate(mut roots: Vec<TemplateNode>) -> Result<RenderFn, CompileError> {
    if roots.is_empty() {
        return Err(CompileError::EmptyTemplate);
    }
    if roots.len() > 1 {
        warn!(roots = roots.len(), "template has several roots; rendering the first");
    }
    let root = roots.swap_remove(0);
    let render: RenderFn = Rc::new(move |ctx: &RenderContext| build_node(&root, ctx));
    Ok(render)
}

fn build_node(node: &TemplateNode, ctx: &RenderContext) -> VNode {
    match node {
        TemplateNode::Element { tag, attrs, children } => {
            let props: Props = attrs.iter().map(|attr| build_attribute(attr, ctx)).collect();
            let children: Vec<Child> = children.iter().map(|child| build_child(child, ctx)).collect();
            VNode::new(tag.as_str(), props, children)
        }
        TemplateNode::Text { content } => VNode::text(content.as_str()),
        TemplateNode::Interpolation { path } => VNode::text(ctx.lookup(path).to_string()),
    }
}

fn build_child(node: &TemplateNode, ctx: &RenderContext) -> Child {
    match node {
        TemplateNode::Text { content } => Child::Text(content.clone()),
        TemplateNode::Interpolation { path } => Child::from(ctx.lookup(path)),
        element => Child::Node(build_node(element, ctx)),
    }
}

fn build_attribute(attr: &Attribute, ctx: &RenderContext) -> (String, Value) {
    match attr {
        Attribute::Static { name, value } => (name.clone(), Value::from(value.as_str())),
        Attribute::Bind { name, path } => (name.clone(), ctx.lookup(path)),
        Attribute::On { event, path } => (handler_key(event), ctx.lookup(path)),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
