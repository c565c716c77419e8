//! Integration Tests for the Runtime
//!
//! These tests drive reactive state, components and the renderer together
//! against the in-memory document.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;

use tendril_core::compiler::{BasicCompiler, CompileError, TemplateCompiler};
use tendril_core::component::RenderFn;
use tendril_core::dom::{Document, HostCall, Recorder};
use tendril_core::{
    create_app, h, props, Component, Effect, Handler, HostOps, Props, Runtime, RuntimeError, SetupResult, VNode,
    Value,
};

fn counter_component(renders: Rc<Cell<usize>>) -> Component {
    Component::builder()
        .name("Counter")
        .setup(|_, ctx| SetupResult::state(ctx.reactive_json(json!({ "count": 0 }))))
        .render(move |ctx| {
            renders.set(renders.get() + 1);
            h("p", Props::new(), [ctx.get("count")])
        })
        .build()
}

/// Test that an effect re-runs once per changed write and never for an
/// equal write.
#[test]
fn effect_tracks_changed_writes_only() {
    let runtime = Runtime::new();
    let state = runtime.reactive_json(json!({ "a": 1, "b": 1 }));
    let runs = Rc::new(Cell::new(0));

    let _effect = Effect::new({
        let state = state.clone();
        let runs = runs.clone();
        move || {
            let _ = state.get("a");
            let _ = state.get("a");
            runs.set(runs.get() + 1);
        }
    });
    assert_eq!(runs.get(), 1);

    state.set("a", 2);
    assert_eq!(runs.get(), 2);

    state.set("a", 2);
    assert_eq!(runs.get(), 2);

    state.set("b", 5);
    assert_eq!(runs.get(), 2);
}

/// Test the mount scenario: one element with one text child, in order.
#[test]
fn hello_scenario_mounts_element_then_text() {
    let document = Document::new();
    let root = document.create_root("app");
    let hello = Component::from_render(|_| h("div", Props::new(), ["Hello"]));

    let mut app = create_app(Recorder::new(document), hello);
    app.mount(root).expect("mount");

    let calls = app.host().calls();
    let (div, text) = match &calls[..] {
        [HostCall::CreateElement { tag, node: div }, HostCall::CreateText { content, node: text }, ..] => {
            assert_eq!(tag, "div");
            assert_eq!(content, "Hello");
            (*div, *text)
        }
        other => panic!("unexpected calls: {other:?}"),
    };
    assert_eq!(
        &calls[2..],
        &[
            HostCall::Insert { child: text, parent: div, anchor: None },
            HostCall::Insert { child: div, parent: root, anchor: None },
        ]
    );

    let document = app.host().inner();
    assert_eq!(document.children(root), vec![div]);
    assert_eq!(document.children(div), vec![text]);
}

/// Test that a state write re-renders the component exactly once and
/// updates the host text in place.
#[test]
fn component_rerenders_on_state_write() {
    let document = Document::new();
    let root = document.create_root("app");
    let renders = Rc::new(Cell::new(0));

    let mut app = create_app(Recorder::new(document), counter_component(renders.clone()));
    app.mount("#app").expect("mount");
    assert_eq!(renders.get(), 1);

    let state = app.root_instance().and_then(|i| i.state()).expect("state");
    app.host().clear();
    state.set("count", 1);

    assert_eq!(renders.get(), 2);
    let mutations = app.host().mutations();
    assert!(matches!(&mutations[..], [HostCall::SetText { content, .. }] if content == "1"));
    assert_eq!(app.host().inner().to_html(root), "<div id=\"app\"><p>1</p></div>");
}

/// Test that re-rendering an unchanged tree touches nothing.
#[test]
fn unchanged_rerender_issues_no_mutations() {
    let document = Document::new();
    let root = document.create_root("app");
    let component = Component::builder()
        .setup(|_, ctx| SetupResult::state(ctx.reactive_json(json!({ "title": "t", "tick": 0 }))))
        .render(|ctx| {
            let _ = ctx.get("tick");
            h(
                "section",
                props([("class", "card")]),
                [h("h1", Props::new(), [ctx.get("title")]), h("p", Props::new(), "body")],
            )
        })
        .build();

    let mut app = create_app(Recorder::new(document), component);
    app.mount(root).expect("mount");
    app.host().clear();

    let instance = app.root_instance().expect("instance");
    instance.state().expect("state").set("tick", 1);

    assert_eq!(instance.render_count(), 2);
    assert!(app.host().mutations().is_empty());
}

/// Test that a parent passing a new prop runs the child's effect exactly
/// once with the new value.
#[test]
fn parent_prop_change_updates_child_once() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let child = Component::builder()
        .name("Child")
        .props(["msg"])
        .render({
            let seen = seen.clone();
            move |ctx| {
                seen.borrow_mut().push(ctx.get("msg").to_string());
                h("span", Props::new(), [ctx.get("msg")])
            }
        })
        .build();
    let parent = Component::builder()
        .name("Parent")
        .setup(|_, ctx| SetupResult::state(ctx.reactive_json(json!({ "msg": "a" }))))
        .render(move |ctx| {
            h(
                "div",
                Props::new(),
                [VNode::component(&child, props([("msg", ctx.get("msg"))]))],
            )
        })
        .build();

    let document = Document::new();
    let root = document.create_root("app");
    let mut app = create_app(document, parent);
    app.mount(root).expect("mount");

    let state = app.root_instance().and_then(|i| i.state()).expect("state");
    state.set("msg", "b");

    assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(app.host().to_html(root), "<div id=\"app\"><div><span>b</span></div></div>");
}

/// Test that a child's emitted event reaches the parent's listener and the
/// parent re-renders.
#[test]
fn emitted_event_updates_parent() {
    let button = Component::builder()
        .name("IncrementButton")
        .setup(|_, ctx| {
            let emitter = ctx.emitter();
            SetupResult::render(move |_| {
                let emitter = emitter.clone();
                let on_click = Handler::new(move |_| {
                    emitter.emit("increment", &[Value::from(2)]);
                });
                h("button", props([("onClick", on_click)]), "+")
            })
        })
        .build();

    let parent = Component::builder()
        .setup(|_, ctx| SetupResult::state(ctx.reactive_json(json!({ "count": 0 }))))
        .render(move |ctx| {
            let state = ctx.state().cloned();
            let on_increment = Handler::new(move |args| {
                let by = args.first().and_then(Value::as_f64).unwrap_or(1.0);
                if let Some(state) = &state {
                    state.update("count", |count| Value::from(count.as_f64().unwrap_or(0.0) + by));
                }
            });
            h(
                "div",
                Props::new(),
                [
                    h("output", Props::new(), [ctx.get("count")]),
                    VNode::component(&button, props([("onIncrement", on_increment)])),
                ],
            )
        })
        .build();

    let document = Document::new();
    let root = document.create_root("app");
    let mut app = create_app(document, parent);
    app.mount(root).expect("mount");

    let document = app.host();
    let button_el = document.find_by_tag("button").expect("button");
    let output = document.find_by_tag("output").expect("output");

    assert!(document.dispatch(button_el, "click", &[]));
    assert_eq!(document.text_content(output), "2");

    assert!(document.dispatch(button_el, "click", &[]));
    assert_eq!(document.text_content(output), "4");
}

struct CountingCompiler {
    inner: BasicCompiler,
    calls: Rc<Cell<usize>>,
}

impl TemplateCompiler for CountingCompiler {
    fn compile(&self, source: &str) -> Result<RenderFn, CompileError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.compile(source)
    }
}

/// Test that a template is compiled once and shared by every instance.
#[test]
fn template_is_compiled_once_per_definition() {
    let item = Component::builder()
        .name("Item")
        .props(["label"])
        .template(r#"<li class="item">{{ label }}</li>"#)
        .build();
    let list = Component::from_render({
        let item = item.clone();
        move |_| {
            h(
                "ul",
                Props::new(),
                [
                    VNode::component(&item, props([("label", "a")])),
                    VNode::component(&item, props([("label", "b")])),
                ],
            )
        }
    });

    let calls = Rc::new(Cell::new(0));
    let document = Document::new();
    let root = document.create_root("app");
    let mut app = create_app(document, list).with_compiler(CountingCompiler {
        inner: BasicCompiler::new(),
        calls: calls.clone(),
    });
    app.mount(root).expect("mount");

    assert_eq!(calls.get(), 1);
    assert!(item.is_compiled());
    assert_eq!(
        app.host().to_html(root),
        "<div id=\"app\"><ul><li class=\"item\">a</li><li class=\"item\">b</li></ul></div>"
    );
}

/// Test that template bindings stay reactive.
#[test]
fn template_bindings_rerender_on_write() {
    let greeting = Component::builder()
        .setup(|_, ctx| SetupResult::state(ctx.reactive_json(json!({ "user": { "name": "ada" }, "tone": "calm" }))))
        .template(r#"<p :class="tone">Hello {{ user.name }}</p>"#)
        .build();

    let document = Document::new();
    let root = document.create_root("app");
    let mut app = create_app(document, greeting).with_compiler(BasicCompiler::new());
    app.mount(root).expect("mount");
    assert_eq!(app.host().to_html(root), "<div id=\"app\"><p class=\"calm\">Hello ada</p></div>");

    let state = app.root_instance().and_then(|i| i.state()).expect("state");
    state.object("user").expect("user").set("name", "grace");
    state.set("tone", "loud");

    assert_eq!(app.host().to_html(root), "<div id=\"app\"><p class=\"loud\">Hello grace</p></div>");
}

/// Test that configuration errors surface from mount.
#[test]
fn configuration_errors_surface_from_mount() {
    let document = Document::new();
    let root = document.create_root("app");
    let mut app = create_app(document, Component::builder().name("Empty").build());
    assert!(matches!(
        app.mount(root),
        Err(RuntimeError::MissingRender { component }) if component == "Empty"
    ));

    let document = Document::new();
    let root = document.create_root("app");
    let templated = Component::builder().name("Templated").template("<p></p>").build();
    let mut app = create_app(document, templated);
    assert!(matches!(app.mount(root), Err(RuntimeError::CompilerMissing { .. })));

    let document = Document::new();
    let root = document.create_root("app");
    let broken = Component::builder().name("Broken").template("<p>").build();
    let mut app = create_app(document, broken).with_compiler(BasicCompiler::new());
    match app.mount(root) {
        Err(RuntimeError::Compile { component, source }) => {
            assert_eq!(component, "Broken");
            assert_eq!(source, CompileError::UnclosedTag { tag: "p".into(), offset: 0 });
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

/// Test that the recorder forwards every call to the wrapped host.
#[test]
fn recorder_wraps_any_host() {
    fn mount_text<H: HostOps>(host: &H) -> usize {
        let el = host.create_element("div");
        let text = host.create_text("x");
        host.insert(text, el, None);
        host.parent_node(text).map_or(0, |_| 1)
    }

    let recorder = Recorder::new(Document::new());
    assert_eq!(mount_text(&recorder), 1);
    assert_eq!(recorder.mutations().len(), 3);
}
