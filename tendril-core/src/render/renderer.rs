//! Reconciliation
//!
//! [`Renderer::patch`] compares a previous described node with the next one
//! and applies the difference to the host:
//!
//! - no previous node: mount (construct and insert);
//! - text nodes: update the content in place if it changed;
//! - elements: patch children index by index, then reapply changed props;
//! - components: hand the new node to the existing instance and let its
//!   render effect do the rest.
//!
//! Children are matched by position only. Trailing children that exist on
//! one side but not the other are left alone, and props missing from the
//! new node are not unset.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use super::host::{HostNode, HostOps};
use super::vnode::{child_nodes_mut, flatten_children, Child, Children, NodeKind, VNode};
use crate::compiler::TemplateCompiler;
use crate::component::{Component, Instance, UpdateEffect};
use crate::error::Result;
use crate::reactive::{Effect, Runtime};

/// Drives a host through [`HostOps`]. Clones share the host, the runtime
/// and the registered compiler.
pub struct Renderer<H: HostOps> {
    inner: Rc<RendererInner<H>>,
}

struct RendererInner<H> {
    host: H,
    runtime: Runtime,
    compiler: RefCell<Option<Rc<dyn TemplateCompiler>>>,
}

impl<H: HostOps + 'static> Renderer<H> {
    /// Create a renderer with its own runtime.
    pub fn new(host: H) -> Self {
        Self::with_runtime(host, Runtime::new())
    }

    /// Create a renderer that tracks dependencies in `runtime`.
    pub fn with_runtime(host: H, runtime: Runtime) -> Self {
        Self {
            inner: Rc::new(RendererInner {
                host,
                runtime,
                compiler: RefCell::new(None),
            }),
        }
    }

    /// Register the compiler used for components that only have a template.
    pub fn register_compiler<C>(&self, compiler: C)
    where
        C: TemplateCompiler + 'static,
    {
        *self.inner.compiler.borrow_mut() = Some(Rc::new(compiler));
    }

    /// Whether a template compiler is registered.
    pub fn has_compiler(&self) -> bool {
        self.inner.compiler.borrow().is_some()
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Reconcile `n2` against `n1` inside `container`.
    ///
    /// On return `n2` carries the host handle (and for components the live
    /// instance), so it can serve as `n1` of the next patch.
    pub fn patch(&self, n1: Option<&mut VNode>, n2: &mut VNode, container: HostNode) -> Result<()> {
        self.patch_at(n1, n2, container, None)
    }

    fn patch_at(
        &self,
        n1: Option<&mut VNode>,
        n2: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let n1 = match n1 {
            Some(old) if !old.same_kind(n2) => {
                warn!(previous = ?old.kind(), next = ?n2.kind(), "node kind changed at the same position");
                let (container, anchor) = match old.el().and_then(|el| self.host().parent_node(el)) {
                    Some(parent) => (parent, old.el()),
                    None => (container, anchor),
                };
                return self.patch_at(None, n2, container, anchor);
            }
            other => other,
        };

        match n2.kind() {
            NodeKind::Text(_) => self.process_text(n1, n2, container, anchor),
            NodeKind::Element(tag) => {
                let tag = tag.clone();
                self.process_element(&tag, n1, n2, container, anchor)
            }
            NodeKind::Component(component) => {
                let component = component.clone();
                self.process_component(&component, n1, n2, container, anchor)
            }
            NodeKind::Empty => Ok(()),
        }
    }

    // ---- Text ----

    fn process_text(
        &self,
        n1: Option<&mut VNode>,
        n2: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let content = n2.kind().as_text().unwrap_or_default();

        match n1.and_then(|old| old.el().map(|el| (el, old))) {
            Some((el, old)) => {
                if old.kind().as_text() != Some(content) {
                    trace!(%el, content, "set text");
                    self.host().set_text(el, content);
                }
                n2.el = Some(el);
            }
            None => {
                let el = self.host().create_text(content);
                self.host().insert(el, container, anchor);
                n2.el = Some(el);
            }
        }
        Ok(())
    }

    // ---- Elements ----

    fn process_element(
        &self,
        tag: &str,
        n1: Option<&mut VNode>,
        n2: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        match n1.and_then(|old| old.el().map(|el| (el, old))) {
            Some((el, old)) => self.patch_element(el, old, n2),
            None => self.mount_element(tag, n2, container, anchor),
        }
    }

    fn mount_element(&self, tag: &str, node: &mut VNode, container: HostNode, anchor: Option<HostNode>) -> Result<()> {
        let host = self.host();
        let el = host.create_element(tag);
        node.el = Some(el);

        let (_, props, children) = node.parts_mut();
        match children {
            Children::Text(text) => host.set_element_text(el, text),
            Children::Nodes(children) => self.mount_children(children, el)?,
        }
        for (key, value) in props {
            host.patch_prop(el, key, value);
        }

        host.insert(el, container, anchor);
        trace!(tag, %el, "mounted element");
        Ok(())
    }

    fn mount_children(&self, children: &mut Vec<Child>, el: HostNode) -> Result<()> {
        flatten_children(children);
        for child in child_nodes_mut(children) {
            self.patch_at(None, child, el, None)?;
        }
        settle_anchors(children);
        Ok(())
    }

    fn patch_element(&self, el: HostNode, old: &mut VNode, node: &mut VNode) -> Result<()> {
        node.el = Some(el);
        self.patch_children(el, old, node)?;

        let host = self.host();
        for (key, value) in node.props() {
            if old.props().get(key) != Some(value) {
                trace!(%el, key, "patch prop");
                host.patch_prop(el, key, value);
            }
        }
        Ok(())
    }

    fn patch_children(&self, el: HostNode, old: &mut VNode, node: &mut VNode) -> Result<()> {
        let host = self.host();
        let (_, _, previous) = old.parts_mut();
        let (_, _, next) = node.parts_mut();

        match (previous, next) {
            (Children::Text(previous), Children::Text(next)) => {
                if previous != next {
                    host.set_element_text(el, next);
                }
            }
            (Children::Nodes(_), Children::Text(next)) => host.set_element_text(el, next),
            (Children::Text(_), Children::Nodes(next)) => {
                host.set_element_text(el, "");
                self.mount_children(next, el)?;
            }
            (Children::Nodes(previous), Children::Nodes(next)) => {
                flatten_children(previous);
                flatten_children(next);
                if previous.len() != next.len() {
                    warn!(
                        %el,
                        previous = previous.len(),
                        next = next.len(),
                        "child count changed; unmatched children are left as they are"
                    );
                }
                let anchors = following_nodes(previous);
                for ((old_child, child), anchor) in child_nodes_mut(previous).zip(child_nodes_mut(next)).zip(anchors) {
                    self.patch_at(Some(old_child), child, el, anchor)?;
                }

                // Unmatched new children stay unmounted and leave the stored tree.
                next.truncate(previous.len());
                settle_anchors(next);
            }
        }
        Ok(())
    }

    // ---- Components ----

    fn process_component(
        &self,
        component: &Component,
        n1: Option<&mut VNode>,
        n2: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        match n1.and_then(|old| old.component.take()) {
            Some(instance) => self.update_component(instance, n2, anchor),
            None => self.mount_component(component, n2, container, anchor),
        }
    }

    fn mount_component(
        &self,
        component: &Component,
        node: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) -> Result<()> {
        let instance = Instance::new(component, node, self.runtime());
        let compiler = self.inner.compiler.borrow().clone();
        instance.setup(compiler.as_deref())?;
        node.component = Some(instance.clone());
        instance.set_anchor(anchor);

        let effect = self.component_effect(&instance, container);
        instance.bind_effect(effect.clone());
        effect.run()?;

        node.el = instance.el();
        Ok(())
    }

    /// The render effect of an instance. It holds the instance weakly; the
    /// instance owns the effect.
    fn component_effect(&self, instance: &Instance, container: HostNode) -> UpdateEffect {
        let weak = instance.downgrade();
        let renderer = self.clone();

        Effect::new_lazy(move || {
            let Some(instance) = weak.upgrade() else {
                return Ok(());
            };
            let result = renderer.run_component(&instance, container);
            if let Err(err) = &result {
                if instance.is_mounted() {
                    error!(component = %instance.name(), id = instance.id(), error = %err, "component update failed");
                }
            }
            result
        })
    }

    fn run_component(&self, instance: &Instance, container: HostNode) -> Result<()> {
        let anchor = instance.anchor();
        if !instance.is_mounted() {
            let mut sub_tree = instance.render();
            self.patch_at(None, &mut sub_tree, container, anchor)?;
            instance.finish_mount(sub_tree);
            debug!(component = %instance.name(), id = instance.id(), "mounted component");
            return Ok(());
        }

        instance.apply_pending_next();
        let mut next_tree = instance.render();
        let Some(mut prev_tree) = instance.take_sub_tree() else {
            return Ok(());
        };

        let container = prev_tree
            .el()
            .and_then(|el| self.host().parent_node(el))
            .unwrap_or(container);
        let result = self.patch_at(Some(&mut prev_tree), &mut next_tree, container, anchor);
        instance.replace_sub_tree(next_tree);
        debug!(component = %instance.name(), id = instance.id(), "updated component");
        result
    }

    fn update_component(&self, instance: Instance, node: &mut VNode, anchor: Option<HostNode>) -> Result<()> {
        instance.set_next(node);
        instance.set_anchor(anchor);
        node.component = Some(instance.clone());
        instance.update()?;
        node.el = instance.el();
        Ok(())
    }
}

/// For each child of a flattened list, the host node of the nearest
/// following sibling that has one.
fn following_nodes(children: &[Child]) -> Vec<Option<HostNode>> {
    let mut anchors = vec![None; children.len()];
    let mut following = None;
    for (slot, child) in anchors.iter_mut().zip(children).rev() {
        *slot = following;
        if let Child::Node(node) = child {
            following = node.el().or(following);
        }
    }
    anchors
}

/// Point every component child at its following sibling, so a render that
/// had no root node can later insert at its own position.
fn settle_anchors(children: &mut [Child]) {
    let anchors = following_nodes(children);
    for (child, anchor) in child_nodes_mut(children).zip(anchors) {
        if let Some(instance) = &child.component {
            instance.set_anchor(anchor);
        }
    }
}

impl<H: HostOps> Clone for Renderer<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: HostOps> fmt::Debug for Renderer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("runtime", &self.inner.runtime)
            .field("has_compiler", &self.inner.compiler.borrow().is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
