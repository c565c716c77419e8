//! Component Instances
//!
//! An [`Instance`] is the live state of one mounted component node: its
//! resolved props, the state returned by setup, the rendered sub-tree and
//! the render effect that keeps the sub-tree in sync.
//!
//! Ownership runs one way. The instance owns its effect; the effect closure
//! holds only a weak handle back to the instance; the dependency graph holds
//! only weak handles to effects. A pending node from the parent is stored
//! detached, without its own instance, so no cycle forms through it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::{Component, Emitter, RenderContext, RenderFn, SetupContext, SetupResult};
use crate::compiler::TemplateCompiler;
use crate::error::Result;
use crate::reactive::{untracked, Effect, Reactive, Record, Runtime, Value};
use crate::render::{HostNode, Props, VNode};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// The render effect of an instance. Its result reports host errors from
/// the run that produced it.
pub(crate) type UpdateEffect = Effect<Result<()>>;

struct InstanceState {
    id: u64,
    component: Component,
    vnode: VNode,
    sub_tree: Option<VNode>,
    next: Option<VNode>,
    effect: Option<UpdateEffect>,
    props: Reactive,
    setup_state: Option<Reactive>,
    render: Option<RenderFn>,
    ctx: Option<Rc<RenderContext>>,
    emitter: Emitter,
    el: Option<HostNode>,
    anchor: Option<HostNode>,
    is_mounted: bool,
}

/// The live state of one mounted component.
#[derive(Clone)]
pub struct Instance(Rc<RefCell<InstanceState>>);

/// A non-owning handle to an [`Instance`].
#[derive(Clone)]
pub(crate) struct WeakInstance(Weak<RefCell<InstanceState>>);

impl WeakInstance {
    pub(crate) fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(Instance)
    }
}

/// The supplied props whose names are declared. Undeclared props are dropped.
fn resolve_props<'a>(declared: &'a [String], supplied: &'a Props) -> impl Iterator<Item = (&'a str, &'a Value)> {
    declared
        .iter()
        .filter_map(move |name| supplied.get(name).map(|value| (name.as_str(), value)))
}

impl Instance {
    /// Create an instance for a component node. Props are resolved against
    /// the declared names right away; setup has not run yet.
    pub(crate) fn new(component: &Component, vnode: &VNode, runtime: &Runtime) -> Self {
        let record = Record::new();
        for (name, value) in resolve_props(component.declared_props(), vnode.props()) {
            record.insert(name, value.clone());
        }

        let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        Self(Rc::new(RefCell::new(InstanceState {
            id,
            component: component.clone(),
            vnode: vnode.detached(),
            sub_tree: None,
            next: None,
            effect: None,
            props: runtime.reactive(record),
            setup_state: None,
            render: None,
            ctx: None,
            emitter: Emitter::new(vnode.props().clone()),
            el: None,
            anchor: None,
            is_mounted: false,
        })))
    }

    /// Run setup and resolve the render function.
    pub(crate) fn setup(&self, compiler: Option<&dyn TemplateCompiler>) -> Result<()> {
        let (component, props, emitter) = {
            let state = self.0.borrow();
            (state.component.clone(), state.props.clone(), state.emitter.clone())
        };

        let outcome = match component.setup_fn() {
            Some(setup) => {
                let ctx = SetupContext::new(emitter.clone(), props.runtime().clone());
                untracked(|| setup(&props, &ctx))
            }
            None => SetupResult::None,
        };

        let (render, setup_state) = match outcome {
            SetupResult::Render(render) => (render, None),
            SetupResult::State(state) => (component.resolve_render(compiler)?, Some(state)),
            SetupResult::None => (component.resolve_render(compiler)?, None),
        };

        let ctx = Rc::new(RenderContext::new(props, setup_state.clone(), emitter));
        let mut state = self.0.borrow_mut();
        debug!(
            component = component.name(),
            id = state.id,
            has_state = setup_state.is_some(),
            "component setup"
        );
        state.render = Some(render);
        state.setup_state = setup_state;
        state.ctx = Some(ctx);
        Ok(())
    }

    pub(crate) fn downgrade(&self) -> WeakInstance {
        WeakInstance(Rc::downgrade(&self.0))
    }

    pub(crate) fn bind_effect(&self, effect: UpdateEffect) {
        effect.set_owner(self.id());
        self.0.borrow_mut().effect = Some(effect);
    }

    /// Call the render function. Reads made here are tracked by whatever
    /// effect is running, which is this instance's own effect.
    pub(crate) fn render(&self) -> VNode {
        let (render, ctx) = {
            let state = self.0.borrow();
            match (state.render.clone(), state.ctx.clone()) {
                (Some(render), Some(ctx)) => (render, ctx),
                _ => {
                    warn!(component = state.component.name(), "render before setup");
                    return VNode::empty();
                }
            }
        };
        render(&ctx)
    }

    /// Record the first rendered sub-tree.
    pub(crate) fn finish_mount(&self, sub_tree: VNode) {
        let mut state = self.0.borrow_mut();
        state.el = sub_tree.el();
        state.sub_tree = Some(sub_tree);
        state.is_mounted = true;
    }

    pub(crate) fn take_sub_tree(&self) -> Option<VNode> {
        self.0.borrow_mut().sub_tree.take()
    }

    pub(crate) fn replace_sub_tree(&self, sub_tree: VNode) {
        let mut state = self.0.borrow_mut();
        state.el = sub_tree.el();
        state.sub_tree = Some(sub_tree);
    }

    /// The sibling a rootless render inserts before once it gains a node.
    pub(crate) fn anchor(&self) -> Option<HostNode> {
        self.0.borrow().anchor
    }

    pub(crate) fn set_anchor(&self, anchor: Option<HostNode>) {
        self.0.borrow_mut().anchor = anchor;
    }

    /// Store the node the parent rendered for this component. It is adopted
    /// on the next run of the render effect.
    pub(crate) fn set_next(&self, vnode: &VNode) {
        self.0.borrow_mut().next = Some(vnode.detached());
    }

    /// Adopt the pending node, if any: swap the listeners and bring the
    /// declared props in line with what the parent supplied.
    ///
    /// Prop writes happen while this instance's effect is running, so they
    /// do not re-trigger it.
    pub(crate) fn apply_pending_next(&self) {
        let (supplied, props, emitter, component) = {
            let mut state = self.0.borrow_mut();
            let Some(next) = state.next.take() else {
                return;
            };
            let supplied = next.props().clone();
            state.vnode = next;
            (supplied, state.props.clone(), state.emitter.clone(), state.component.clone())
        };

        for name in component.declared_props() {
            match supplied.get(name) {
                Some(value) => {
                    props.set(name, value.clone());
                }
                None => {
                    props.remove(name);
                }
            }
        }
        emitter.replace(supplied);
    }

    /// Re-run the render effect.
    ///
    /// Skipped with a warning if the effect is already running, which means
    /// a render function tried to update its own component.
    pub fn update(&self) -> Result<()> {
        let Some(effect) = self.effect() else {
            return Ok(());
        };
        if effect.is_running() {
            warn!(component = %self.name(), id = self.id(), "update requested during own render");
            return Ok(());
        }
        effect.run()
    }

    /// Invoke the parent's listener for `event`, if any.
    pub fn emit(&self, event: &str, args: &[Value]) -> bool {
        let emitter = self.0.borrow().emitter.clone();
        emitter.emit(event, args)
    }

    /// Unique identifier of this instance.
    pub fn id(&self) -> u64 {
        self.0.borrow().id
    }

    /// The display name of the component.
    pub fn name(&self) -> String {
        self.0.borrow().component.name().to_owned()
    }

    /// The component definition.
    pub fn component(&self) -> Component {
        self.0.borrow().component.clone()
    }

    /// The resolved props.
    pub fn props(&self) -> Reactive {
        self.0.borrow().props.clone()
    }

    /// The state returned by setup, if any.
    pub fn state(&self) -> Option<Reactive> {
        self.0.borrow().setup_state.clone()
    }

    /// The host node of the rendered sub-tree root.
    pub fn el(&self) -> Option<HostNode> {
        self.0.borrow().el
    }

    /// Whether the first render has completed.
    pub fn is_mounted(&self) -> bool {
        self.0.borrow().is_mounted
    }

    /// The render effect, once bound.
    pub fn effect(&self) -> Option<Effect<Result<()>>> {
        self.0.borrow().effect.clone()
    }

    /// How many times the render effect has run.
    pub fn render_count(&self) -> usize {
        self.effect().map_or(0, |effect| effect.run_count())
    }

    /// A copy of the current sub-tree, without host handles.
    pub fn sub_tree(&self) -> Option<VNode> {
        self.0.borrow().sub_tree.as_ref().map(VNode::detached)
    }

    /// The props of the node this instance was last rendered from.
    pub fn vnode_props(&self) -> Props {
        self.0.borrow().vnode.props().clone()
    }

    /// Whether two handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(state) => f
                .debug_struct("Instance")
                .field("id", &state.id)
                .field("component", &state.component.name())
                .field("el", &state.el)
                .field("is_mounted", &state.is_mounted)
                .finish(),
            Err(_) => f.write_str("Instance { <borrowed> }"),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
