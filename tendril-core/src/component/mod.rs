//! Components
//!
//! A [`Component`] is a definition: declared prop names, an optional setup
//! function, and either a render function or a template for the registered
//! compiler. Mounting a component node creates an [`Instance`] that holds the
//! live state and the render effect.
//!
//! # Setup
//!
//! Setup runs once per instance, untracked, with the resolved props and a
//! [`SetupContext`]. Its [`SetupResult`] decides how the instance renders:
//!
//! - `Render(f)` makes `f` the render function, bypassing any template;
//! - `State(s)` exposes `s` to the render function through [`RenderContext`];
//! - `None` leaves render-time state empty.
//!
//! Without a render function from either setup or the definition, the
//! template is compiled (once per definition). Having neither is a
//! [`RuntimeError::MissingRender`].

mod emit;
mod instance;

pub use emit::{handler_key, Emitter};
pub use instance::Instance;
pub(crate) use instance::{UpdateEffect, WeakInstance};

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::compiler::TemplateCompiler;
use crate::error::{Result, RuntimeError};
use crate::reactive::{Reactive, Runtime, Value};
use crate::render::VNode;

/// A render function: builds the described tree from the render context.
pub type RenderFn = Rc<dyn Fn(&RenderContext) -> VNode>;

/// A setup function: runs once per instance with its props.
pub type SetupFn = Rc<dyn Fn(&Reactive, &SetupContext) -> SetupResult>;

/// What a setup function hands back.
#[derive(Clone)]
pub enum SetupResult {
    /// Use this function to render.
    Render(RenderFn),
    /// Expose this state to the render function.
    State(Reactive),
    /// Nothing usable; render-time state stays empty.
    None,
}

impl SetupResult {
    /// Shorthand for [`SetupResult::Render`].
    pub fn render<F>(render: F) -> Self
    where
        F: Fn(&RenderContext) -> VNode + 'static,
    {
        SetupResult::Render(Rc::new(render))
    }

    /// Shorthand for [`SetupResult::State`].
    pub fn state(state: Reactive) -> Self {
        SetupResult::State(state)
    }
}

impl fmt::Debug for SetupResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupResult::Render(_) => f.write_str("Render"),
            SetupResult::State(state) => f.debug_tuple("State").field(state).finish(),
            SetupResult::None => f.write_str("None"),
        }
    }
}

/// Capabilities passed to a setup function.
#[derive(Debug, Clone)]
pub struct SetupContext {
    emitter: Emitter,
    runtime: Runtime,
}

impl SetupContext {
    pub(crate) fn new(emitter: Emitter, runtime: Runtime) -> Self {
        Self { emitter, runtime }
    }

    /// Invoke the parent's listener for `event`, if any.
    pub fn emit(&self, event: &str, args: &[Value]) -> bool {
        self.emitter.emit(event, args)
    }

    /// A clonable handle to the emit capability, for use in closures.
    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }

    /// The runtime the component lives in.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Create reactive state from JSON.
    pub fn reactive_json(&self, json: serde_json::Value) -> Reactive {
        self.runtime.reactive_json(json)
    }
}

/// What a render function can see.
#[derive(Debug, Clone)]
pub struct RenderContext {
    props: Reactive,
    state: Option<Reactive>,
    emitter: Emitter,
}

impl RenderContext {
    pub(crate) fn new(props: Reactive, state: Option<Reactive>, emitter: Emitter) -> Self {
        Self {
            props,
            state,
            emitter,
        }
    }

    /// The resolved props.
    pub fn props(&self) -> &Reactive {
        &self.props
    }

    /// The state returned by setup, if any.
    pub fn state(&self) -> Option<&Reactive> {
        self.state.as_ref()
    }

    /// Read `key` from setup state if present there, otherwise from props.
    pub fn get(&self, key: &str) -> Value {
        if let Some(state) = &self.state {
            if state.has(key) {
                return state.get(key);
            }
        }
        self.props.get(key)
    }

    /// Resolve a dotted path such as `user.name` or `items.0`, tracking each
    /// step. Anything unresolvable reads as [`Value::Null`].
    pub fn lookup(&self, path: &str) -> Value {
        let mut segments = path.split('.').map(str::trim);
        let Some(first) = segments.next() else {
            return Value::Null;
        };

        let runtime = self.props.runtime();
        segments.fold(self.get(first), |current, segment| match current {
            Value::Record(record) => runtime.reactive(record).get(segment),
            Value::List(list) => match segment.parse::<usize>() {
                Ok(index) => runtime.reactive_list(list).get(index),
                Err(_) => Value::Null,
            },
            _ => Value::Null,
        })
    }

    /// Invoke the parent's listener for `event`, if any.
    pub fn emit(&self, event: &str, args: &[Value]) -> bool {
        self.emitter.emit(event, args)
    }

    /// A clonable handle to the emit capability, for use in handlers.
    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }
}

struct ComponentDef {
    name: Option<String>,
    props: Vec<String>,
    setup: Option<SetupFn>,
    render: Option<RenderFn>,
    template: Option<String>,
    compiled: OnceCell<RenderFn>,
}

/// A component definition. Clones share identity.
#[derive(Clone)]
pub struct Component(Rc<ComponentDef>);

impl Component {
    /// Start building a definition.
    pub fn builder() -> ComponentBuilder {
        ComponentBuilder::default()
    }

    /// A definition with only a render function.
    pub fn from_render<F>(render: F) -> Self
    where
        F: Fn(&RenderContext) -> VNode + 'static,
    {
        Self::builder().render(render).build()
    }

    /// The display name, `"anonymous"` if none was given.
    pub fn name(&self) -> &str {
        self.0.name.as_deref().unwrap_or("anonymous")
    }

    /// The declared prop names.
    pub fn declared_props(&self) -> &[String] {
        &self.0.props
    }

    /// The template source, if any.
    pub fn template(&self) -> Option<&str> {
        self.0.template.as_deref()
    }

    /// Whether the template has been compiled and cached.
    pub fn is_compiled(&self) -> bool {
        self.0.compiled.get().is_some()
    }

    /// Whether two handles refer to the same definition.
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn setup_fn(&self) -> Option<SetupFn> {
        self.0.setup.clone()
    }

    /// The render function of the definition: the explicit one, else the
    /// cached or freshly compiled template.
    pub(crate) fn resolve_render(&self, compiler: Option<&dyn TemplateCompiler>) -> Result<RenderFn> {
        if let Some(render) = &self.0.render {
            return Ok(render.clone());
        }
        if let Some(render) = self.0.compiled.get() {
            return Ok(render.clone());
        }

        let Some(template) = self.0.template.as_deref() else {
            return Err(RuntimeError::MissingRender {
                component: self.name().to_owned(),
            });
        };
        let Some(compiler) = compiler else {
            return Err(RuntimeError::CompilerMissing {
                component: self.name().to_owned(),
            });
        };

        let render = compiler
            .compile(template)
            .map_err(|source| RuntimeError::Compile {
                component: self.name().to_owned(),
                source,
            })?;
        debug!(component = self.name(), "compiled template");
        Ok(self.0.compiled.get_or_init(|| render).clone())
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("props", &self.0.props)
            .field("has_setup", &self.0.setup.is_some())
            .field("has_render", &self.0.render.is_some())
            .field("has_template", &self.0.template.is_some())
            .finish()
    }
}

/// Builder for [`Component`].
#[derive(Default)]
pub struct ComponentBuilder {
    name: Option<String>,
    props: Vec<String>,
    setup: Option<SetupFn>,
    render: Option<RenderFn>,
    template: Option<String>,
}

impl ComponentBuilder {
    /// Set the display name used in logs and errors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare the accepted prop names.
    pub fn props<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the setup function.
    pub fn setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&Reactive, &SetupContext) -> SetupResult + 'static,
    {
        self.setup = Some(Rc::new(setup));
        self
    }

    /// Set the render function.
    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&RenderContext) -> VNode + 'static,
    {
        self.render = Some(Rc::new(render));
        self
    }

    /// Set a template for the registered compiler.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Finish the definition.
    pub fn build(self) -> Component {
        Component(Rc::new(ComponentDef {
            name: self.name,
            props: self.props,
            setup: self.setup,
            render: self.render,
            template: self.template,
            compiled: OnceCell::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileError;
    use crate::reactive::Record;
    use serde_json::json;
    use std::cell::Cell;

    struct CountingCompiler {
        calls: Cell<usize>,
    }

    impl TemplateCompiler for CountingCompiler {
        fn compile(&self, source: &str) -> std::result::Result<RenderFn, CompileError> {
            self.calls.set(self.calls.get() + 1);
            let text = source.to_owned();
            let render: RenderFn = Rc::new(move |_: &RenderContext| VNode::text(text.clone()));
            Ok(render)
        }
    }

    fn context(runtime: &Runtime, props: serde_json::Value, state: Option<serde_json::Value>) -> RenderContext {
        RenderContext::new(
            runtime.reactive_json(props),
            state.map(|s| runtime.reactive_json(s)),
            Emitter::default(),
        )
    }

    #[test]
    fn explicit_render_wins_over_template() {
        let component = Component::builder()
            .render(|_| VNode::text("explicit"))
            .template("<p>ignored</p>")
            .build();
        let compiler = CountingCompiler { calls: Cell::new(0) };

        assert!(component.resolve_render(Some(&compiler)).is_ok());
        assert_eq!(compiler.calls.get(), 0);
    }

    #[test]
    fn template_compiles_once_per_definition() {
        let component = Component::builder().template("hello").build();
        let compiler = CountingCompiler { calls: Cell::new(0) };

        component.resolve_render(Some(&compiler)).expect("first");
        component.resolve_render(Some(&compiler)).expect("second");
        assert_eq!(compiler.calls.get(), 1);
        assert!(component.is_compiled());
    }

    #[test]
    fn missing_render_and_template_is_an_error() {
        let component = Component::builder().name("Broken").build();
        let err = component.resolve_render(None).err().expect("error");
        assert!(matches!(err, RuntimeError::MissingRender { component } if component == "Broken"));
    }

    #[test]
    fn template_without_compiler_is_an_error() {
        let component = Component::builder().template("<p></p>").build();
        let err = component.resolve_render(None).err().expect("error");
        assert!(matches!(err, RuntimeError::CompilerMissing { .. }));
    }

    #[test]
    fn render_context_prefers_state_over_props() {
        let runtime = Runtime::new();
        let ctx = context(
            &runtime,
            json!({ "label": "from props", "only_prop": 1 }),
            Some(json!({ "label": "from state" })),
        );

        assert_eq!(ctx.get("label"), Value::from("from state"));
        assert_eq!(ctx.get("only_prop"), Value::from(1));
        assert_eq!(ctx.get("absent"), Value::Null);
    }

    #[test]
    fn state_key_added_later_shadows_prop_for_readers() {
        let runtime = Runtime::new();
        let ctx = context(&runtime, json!({ "label": "from props" }), Some(json!({})));
        let state = ctx.state().cloned().expect("state");
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));

        let sink = seen.clone();
        let _effect = crate::reactive::Effect::new(move || {
            sink.borrow_mut().push(ctx.get("label"));
        });

        state.set("label", "from state");
        assert_eq!(
            *seen.borrow(),
            vec![Value::from("from props"), Value::from("from state")]
        );
    }

    #[test]
    fn lookup_walks_records_and_lists() {
        let runtime = Runtime::new();
        let ctx = context(
            &runtime,
            json!({}),
            Some(json!({ "user": { "name": "ada", "tags": ["x", "y"] } })),
        );

        assert_eq!(ctx.lookup("user.name"), Value::from("ada"));
        assert_eq!(ctx.lookup("user.tags.1"), Value::from("y"));
        assert_eq!(ctx.lookup("user.tags.nope"), Value::Null);
        assert_eq!(ctx.lookup("user.missing.deeper"), Value::Null);
    }

    #[test]
    fn setup_result_constructors() {
        let runtime = Runtime::new();
        let state = runtime.reactive(Record::new());

        assert!(matches!(SetupResult::state(state), SetupResult::State(_)));
        assert!(matches!(SetupResult::render(|_| VNode::empty()), SetupResult::Render(_)));
    }
}
