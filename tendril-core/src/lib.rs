//! Tendril Core
//!
//! This crate provides the core runtime for the Tendril reactive UI library.
//! It implements:
//!
//! - Reactive records and lists with automatic dependency tracking
//! - Effects that re-run synchronously when what they read changes
//! - Described nodes and an index-aligned reconciler over a host contract
//! - Components with setup, props, emitted events and templates
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Reactive values, effects and the runtime that tracks them
//! - `graph`: The dependency graph keyed by target and property
//! - `render`: Described nodes, the host contract and the renderer
//! - `component`: Component definitions and live instances
//! - `compiler`: The template compiler collaborator
//! - `dom`: An in-memory host document
//! - `app`: The application handle
//!
//! # Example
//!
//! ```rust,ignore
//! use tendril_core::{create_app, h, Component, SetupResult, Props};
//! use tendril_core::dom::Document;
//! use serde_json::json;
//!
//! let counter = Component::builder()
//!     .setup(|_, ctx| SetupResult::state(ctx.reactive_json(json!({ "count": 0 }))))
//!     .render(|ctx| h("p", Props::new(), [ctx.get("count")]))
//!     .build();
//!
//! let document = Document::new();
//! document.create_root("app");
//!
//! let mut app = create_app(document, counter);
//! app.mount("#app")?;
//!
//! // Writing the state re-renders the component before `set` returns.
//! let state = app.root_instance().and_then(|i| i.state()).unwrap();
//! state.set("count", 1);
//! ```

pub mod app;
pub mod compiler;
pub mod component;
pub mod dom;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod render;

pub use app::{create_app, App, MountTarget};
pub use compiler::{BasicCompiler, CompileError, TemplateCompiler};
pub use component::{Component, Instance, RenderContext, SetupContext, SetupResult};
pub use error::{Result, RuntimeError};
pub use reactive::{untracked, Effect, Handler, Reactive, ReactiveList, Runtime, Value};
pub use render::{create_node, h, normalize, props, HostNode, HostOps, Props, Renderer, VNode};
