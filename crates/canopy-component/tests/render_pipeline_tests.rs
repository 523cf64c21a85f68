//! Integration tests for the render pipeline.
//!
//! Covers the full flow of:
//! - Placeholder substitution across every built-in instruction
//! - Full, named, recursive, and stealth render modes
//! - Renderer chain delegation through `parent_renderer`
//! - Template extensions queued by plugins
//! - Informational messages and the retry countdown

use canopy_component::testing::TestHost;
use canopy_component::{
    Component, ComponentConfig, Context, ErrorInfo, ErrorOptions, HandlerOutcome, Manifest,
    MessageData, MessageLayout, RenderArgs,
};
use canopy_template::{Element, ExtensionAction, MemoryTarget, Target, TemplateExtension};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// =============================================================================
// Fixtures
// =============================================================================

fn feed_manifest() -> Manifest {
    Manifest::new("News.Feed")
        .main_template(
            "<div class=\"{class:body}\">\
             <h1 class=\"{class:title}\">{data:title}</h1>\
             <ul class=\"{class:items}\"></ul></div>",
        )
        .with_var("layout", json!("wide"))
        .with_config_default("page", json!({"size": 10}))
}

fn feed_config(target: Rc<MemoryTarget>) -> ComponentConfig {
    let mut config = ComponentConfig::new(target, "feed-appkey");
    config.data = json!({"title": "Top stories", "stats": {"total": 42}});
    config
}

fn create_feed(host: &TestHost, target: Rc<MemoryTarget>) -> Component {
    Component::create(
        feed_manifest(),
        feed_config(target),
        Rc::clone(&host.bus),
        host.services(),
    )
}

// =============================================================================
// Substitution
// =============================================================================

#[test]
fn substitution_covers_every_instruction() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    assert_eq!(
        component.substitute("{class:title}", None),
        "news-feed-title"
    );
    assert_eq!(component.substitute("{data:title}", None), "Top stories");
    assert_eq!(component.substitute("{data:stats.total}", None), "42");
    assert_eq!(component.substitute("{label:retrying}", None), "Retrying...");
    assert_eq!(component.substitute("{self:layout}", None), "wide");
    assert_eq!(component.substitute("{config:appkey}", None), "feed-appkey");
    assert_eq!(
        component.substitute("{config:context}", None),
        component.context().as_str()
    );
    assert_eq!(component.substitute("{config:page.size}", None), "10");
}

#[test]
fn self_instruction_prefers_vars_over_data() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    // "title" only exists in the data, "layout" only in the vars
    assert_eq!(component.substitute("{self:title}", None), "Top stories");
    component.set_var("title", json!("Overridden"));
    assert_eq!(component.substitute("{self:title}", None), "Overridden");
}

#[test]
fn unresolved_placeholders_become_empty() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    assert_eq!(component.substitute("[{data:missing}]", None), "[]");
    assert_eq!(component.substitute("[{bogus:key}]", None), "[]");
}

#[test]
fn malformed_braces_pass_through_verbatim() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    assert_eq!(component.substitute("a { b } c", None), "a { b } c");
    assert_eq!(component.substitute("{notaninstruction}", None), "{notaninstruction}");
}

#[test]
fn substitution_is_deterministic() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);
    let template = "<p class=\"{class:x}\">{data:title} / {data:stats.total}</p>";

    let first = component.substitute(template, None);
    let second = component.substitute(template, None);
    assert_eq!(first, second);
}

#[test]
fn explicit_data_overrides_the_instance_data() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    let data = json!({"title": "Other"});
    assert_eq!(component.substitute("{data:title}", Some(&data)), "Other");
}

// =============================================================================
// Render modes
// =============================================================================

#[test]
fn full_render_discovers_named_elements() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    assert!(component.root().is_some());
    for name in ["body", "title", "items"] {
        assert!(component.element(name).is_some(), "missing element {name}");
    }
    assert!(target.markup().contains("<h1 class=\"news-feed-title\">Top stories</h1>"));
}

#[test]
fn repeated_full_renders_produce_identical_markup() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    let first = target.markup();
    component.render();
    assert_eq!(target.markup(), first);
}

#[test]
fn stealth_render_keeps_the_tracked_tree() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let overlay = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));
    let root_before = component.root();
    let main_markup = target.markup();

    let produced = component.render_with(RenderArgs {
        target: Some(overlay.clone()),
        data: Some(json!({"title": "Side note"})),
        ..RenderArgs::default()
    });

    assert!(produced.is_some());
    assert!(overlay.markup().contains("Side note"));
    // the main materialization and the tracked root are untouched
    assert_eq!(target.markup(), main_markup);
    let (before, after) = (root_before.unwrap(), component.root().unwrap());
    assert!(before.ptr_eq(&after));
}

#[test]
fn recursive_render_replaces_the_live_subtree() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.set_data(json!({"title": "Fresh", "stats": {"total": 1}}));
    let replaced = component.render_with(RenderArgs::named_recursive("title"));

    assert!(replaced.is_some());
    assert!(target.markup().contains(">Fresh<"));
    assert!(!target.markup().contains(">Top stories<"));
}

#[test]
fn named_render_of_an_unknown_element_is_none() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    assert!(component.render_with(RenderArgs::named("nope")).is_none());
}

// =============================================================================
// Renderer chains
// =============================================================================

#[test]
fn newest_renderer_runs_first_and_delegates_backwards() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let order = Rc::new(RefCell::new(Vec::new()));

    let base_log = Rc::clone(&order);
    let manifest = feed_manifest().with_renderer(
        "title",
        Rc::new(move |_component: &Component, element: &Element| {
            base_log.borrow_mut().push("base");
            element.set_attr("data-base", "yes");
            element.clone()
        }),
    );
    let component = Component::create(
        manifest,
        feed_config(Rc::clone(&target)),
        Rc::clone(&host.bus),
        host.services(),
    );

    let override_log = Rc::clone(&order);
    component.extend_renderer(
        "title",
        Rc::new(move |component: &Component, element: &Element| {
            override_log.borrow_mut().push("override");
            let continued = component.parent_renderer("title", element);
            continued.set_attr("data-override", "yes");
            continued
        }),
    );

    order.borrow_mut().clear();
    let rendered = component
        .render_with(RenderArgs::named("title"))
        .unwrap();

    assert_eq!(*order.borrow(), vec!["override", "base"]);
    assert_eq!(rendered.attr("data-base").as_deref(), Some("yes"));
    assert_eq!(rendered.attr("data-override").as_deref(), Some("yes"));
}

#[test]
fn exhausted_chains_fall_back_to_a_pass_through() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    component.extend_renderer(
        "title",
        Rc::new(|component: &Component, element: &Element| {
            // no older renderer exists; delegation hands the element back
            component.parent_renderer("title", element)
        }),
    );

    let element = component.element("title").unwrap();
    let rendered = component.render_with(RenderArgs::named("title")).unwrap();
    assert!(rendered.ptr_eq(&element));
}

#[test]
fn discovery_fires_renderer_chains_during_a_full_render() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let manifest = feed_manifest().with_renderer(
        "items",
        Rc::new(move |_component: &Component, element: &Element| {
            counter.set(counter.get() + 1);
            element.clone()
        }),
    );
    Component::create(
        manifest,
        feed_config(target),
        Rc::clone(&host.bus),
        host.services(),
    );

    assert_eq!(hits.get(), 1);
}

// =============================================================================
// Template extensions
// =============================================================================

#[test]
fn extensions_rewrite_the_compiled_tree() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.extend_template(TemplateExtension::new(
        ExtensionAction::InsertAfter,
        "title",
        "<p class=\"{class:byline}\">by {data:author}</p>",
    ));
    component.set_data(json!({"title": "Top stories", "author": "newsroom"}));
    component.render();

    let markup = target.markup();
    assert!(markup.contains("<p class=\"news-feed-byline\">by newsroom</p>"));
    let title_end = markup.find("</h1>").unwrap();
    let byline_start = markup.find("news-feed-byline").unwrap();
    assert!(byline_start > title_end);
    assert!(component.element("byline").is_some());
}

#[test]
fn remove_extensions_drop_the_anchor() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.extend_template(TemplateExtension::remove("items"));
    component.render();

    assert!(!target.markup().contains("news-feed-items"));
}

#[test]
fn extensions_with_missing_anchors_are_skipped() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));
    let before = target.markup();

    component.extend_template(TemplateExtension::new(
        ExtensionAction::InsertBefore,
        "ghost",
        "<p>never</p>",
    ));
    component.render();

    assert_eq!(target.markup(), before);
}

#[test]
fn stealth_renders_skip_extensions() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let overlay = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    component.extend_template(TemplateExtension::new(
        ExtensionAction::InsertAfter,
        "title",
        "<p class=\"{class:byline}\">extra</p>",
    ));
    component.render_with(RenderArgs {
        target: Some(overlay.clone()),
        ..RenderArgs::default()
    });

    assert!(!overlay.markup().contains("news-feed-byline"));
}

// =============================================================================
// Messages
// =============================================================================

#[test]
fn full_layout_messages_render_into_the_target() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.show_message(MessageData::error("Something broke"));

    let markup = target.markup();
    assert!(markup.contains("canopy-message"));
    assert!(markup.contains("canopy-message-error"));
    assert!(markup.contains("Something broke"));
}

#[test]
fn compact_layout_moves_the_text_into_the_title_attribute() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.show_message(
        MessageData::error("Tight fit").with_layout(MessageLayout::Compact),
    );

    let markup = target.markup();
    assert!(markup.contains("title=\"Tight fit\""));
    assert!(!markup.contains(">Tight fit<"));
}

#[test]
fn disabled_info_messages_suppress_overlays() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let mut config = feed_config(Rc::clone(&target));
    config.info_messages = Some(canopy_component::InfoMessages {
        enabled: false,
        layout: MessageLayout::Full,
    });
    let component = Component::create(
        feed_manifest(),
        config,
        Rc::clone(&host.bus),
        host.services(),
    );
    let before = target.markup();

    component.show_message(MessageData::error("hidden"));
    assert_eq!(target.markup(), before);
    assert!(!before.contains("hidden"));
}

#[test]
fn loading_messages_are_stealth() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let rerenders = Rc::new(Cell::new(0));
    let counter = Rc::clone(&rerenders);
    let component = create_feed(&host, Rc::clone(&target));
    host.bus
        .subscribe("News.Feed.onRerender", Context::global(), move |_t, _d| {
            counter.set(counter.get() + 1);
            HandlerOutcome::default()
        });
    let root_before = component.root().unwrap();

    component.show_message(MessageData::loading("Hold tight"));

    assert!(target.markup().contains("Hold tight"));
    assert_eq!(rerenders.get(), 0);
    assert!(component.root().unwrap().ptr_eq(&root_before));
}

// =============================================================================
// Error overlays
// =============================================================================

#[test]
fn known_error_codes_use_the_label_catalog() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.show_error(
        &ErrorInfo::new("wrong_query", "ignored"),
        ErrorOptions::default(),
    );

    assert!(target
        .markup()
        .contains("(wrong_query) Incorrect or missing query parameter."));
}

#[test]
fn unknown_error_codes_fall_back_to_code_and_message() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.show_error(
        &ErrorInfo::new("weird_code", "something odd"),
        ErrorOptions {
            critical: true,
            ..ErrorOptions::default()
        },
    );

    let markup = target.markup();
    assert!(markup.contains("(weird_code) something odd"));
    assert!(markup.contains("canopy-message-error"));
}

#[test]
fn non_critical_errors_render_as_loading_overlays() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.show_error(
        &ErrorInfo::new("weird_code", "transient"),
        ErrorOptions::default(),
    );

    assert!(target.markup().contains("canopy-message-loading"));
}

#[test]
fn retry_countdown_ticks_through_the_timer() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.show_error(
        &ErrorInfo::new("view_limit", "ignored"),
        ErrorOptions {
            retry_in: Some(3000),
            ..ErrorOptions::default()
        },
    );

    // first tick fires immediately
    assert!(target.markup().contains("Retrying in 3 seconds"));
    assert_eq!(host.timer.live_count(), 1);

    host.timer.tick();
    assert!(target.markup().contains("Retrying in 2 seconds"));
    host.timer.tick();
    assert!(target.markup().contains("Retrying in 1 seconds"));

    // the counter pins at zero instead of going negative
    host.timer.tick();
    host.timer.tick();
    assert!(target.markup().contains("Retrying in 1 seconds"));
}

#[test]
fn an_exhausted_countdown_reports_retrying() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.show_error(
        &ErrorInfo::new("view_limit", "ignored"),
        ErrorOptions {
            retry_in: Some(1000),
            ..ErrorOptions::default()
        },
    );
    component.show_error(
        &ErrorInfo::new("view_limit", "ignored"),
        ErrorOptions {
            retry_in: Some(0),
            ..ErrorOptions::default()
        },
    );

    assert!(target.markup().contains("Retrying..."));
}

#[test]
fn destroy_cancels_a_running_countdown() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, Rc::clone(&target));

    component.show_error(
        &ErrorInfo::new("view_limit", "ignored"),
        ErrorOptions {
            retry_in: Some(5000),
            ..ErrorOptions::default()
        },
    );
    assert_eq!(host.timer.live_count(), 1);

    component.destroy();
    assert_eq!(host.timer.live_count(), 0);
}

// =============================================================================
// Guard rails
// =============================================================================

#[test]
fn render_after_destroy_is_none() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let component = create_feed(&host, target);

    component.destroy();
    assert!(component.render().is_none());
    assert!(component
        .render_with(RenderArgs::named("title"))
        .is_none());
}

#[test]
fn empty_main_template_yields_an_empty_tree() {
    let host = TestHost::new(json!({}));
    let target = Rc::new(MemoryTarget::new());
    let mut config = ComponentConfig::new(Rc::clone(&target) as Rc<dyn Target>, "key");
    config.data = json!({});
    let component = Component::create(
        Manifest::new("Bare"),
        config,
        Rc::clone(&host.bus),
        host.services(),
    );

    assert!(component.rendered());
    assert_eq!(target.markup(), "");
    assert!(component.root().is_some());
}
