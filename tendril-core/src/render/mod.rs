//! Rendering
//!
//! Described nodes ([`VNode`]), the host contract ([`HostOps`]) and the
//! [`Renderer`] that reconciles one with the other.

mod host;
mod renderer;
mod vnode;

pub use host::{HostNode, HostOps};
pub use renderer::Renderer;
pub use vnode::{create_node, flatten_children, h, normalize, props, Child, Children, NodeKind, Props, VNode};
