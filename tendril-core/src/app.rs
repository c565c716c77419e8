//! Application Handle
//!
//! An [`App`] pairs a root component with a renderer and mounts it once
//! into a host container, given either as a host node or as a selector the
//! host resolves.

use tracing::{debug, info};

use crate::compiler::TemplateCompiler;
use crate::component::{Component, Instance};
use crate::error::{Result, RuntimeError};
use crate::reactive::Runtime;
use crate::render::{HostNode, HostOps, Props, Renderer, VNode};

/// Where to mount an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountTarget {
    /// An existing host node.
    Node(HostNode),
    /// A selector resolved with [`HostOps::query_selector`].
    Selector(String),
}

impl From<HostNode> for MountTarget {
    fn from(node: HostNode) -> Self {
        MountTarget::Node(node)
    }
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        MountTarget::Selector(selector.to_owned())
    }
}

impl From<String> for MountTarget {
    fn from(selector: String) -> Self {
        MountTarget::Selector(selector)
    }
}

/// A root component bound to a host.
pub struct App<H: HostOps> {
    renderer: Renderer<H>,
    root: Component,
    props: Props,
    container: Option<HostNode>,
    tree: Option<VNode>,
}

/// Create an application rendering `root` into `host`.
pub fn create_app<H: HostOps + 'static>(host: H, root: Component) -> App<H> {
    App::new(Renderer::new(host), root)
}

impl<H: HostOps + 'static> App<H> {
    /// Create an application on an existing renderer.
    pub fn new(renderer: Renderer<H>, root: Component) -> Self {
        Self {
            renderer,
            root,
            props: Props::new(),
            container: None,
            tree: None,
        }
    }

    /// Props passed to the root component.
    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Register a template compiler on the underlying renderer.
    pub fn with_compiler<C>(self, compiler: C) -> Self
    where
        C: TemplateCompiler + 'static,
    {
        self.renderer.register_compiler(compiler);
        self
    }

    /// Mount the root component into `target`.
    ///
    /// Fails with [`RuntimeError::ContainerNotFound`] if a selector does not
    /// resolve, and with [`RuntimeError::AlreadyMounted`] on a second call.
    pub fn mount(&mut self, target: impl Into<MountTarget>) -> Result<HostNode> {
        if self.tree.is_some() {
            return Err(RuntimeError::AlreadyMounted);
        }

        let container = match target.into() {
            MountTarget::Node(node) => node,
            MountTarget::Selector(selector) => self
                .renderer
                .host()
                .query_selector(&selector)
                .ok_or(RuntimeError::ContainerNotFound(selector))?,
        };
        debug!(component = self.root.name(), %container, "mounting application");

        let mut tree = VNode::component(&self.root, self.props.clone());
        self.renderer.patch(None, &mut tree, container)?;
        self.tree = Some(tree);
        self.container = Some(container);

        info!(component = self.root.name(), %container, "application mounted");
        Ok(container)
    }

    pub fn is_mounted(&self) -> bool {
        self.tree.is_some()
    }

    /// The container the application was mounted into.
    pub fn container(&self) -> Option<HostNode> {
        self.container
    }

    /// The live instance of the root component, once mounted.
    pub fn root_instance(&self) -> Option<Instance> {
        self.tree.as_ref().and_then(VNode::instance).cloned()
    }

    pub fn root_component(&self) -> &Component {
        &self.root
    }

    pub fn renderer(&self) -> &Renderer<H> {
        &self.renderer
    }

    pub fn host(&self) -> &H {
        self.renderer.host()
    }

    pub fn runtime(&self) -> &Runtime {
        self.renderer.runtime()
    }
}
