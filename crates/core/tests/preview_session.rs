//! Integration test: drive one playground session end to end: pick a partial
//! from the listing, edit the form, render, revive scripts, fit the result
//! and switch themes.

use std::cell::RefCell;
use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use partial_playground_core::PlaygroundConfig;
use partial_playground_core::partials::{first_selectable, flatten_partials};
use partial_playground_core::preview::{
    DocumentSnapshot, PreviewSync, RenderBackend, RenderError, ReviveStep, ScriptId, ScriptNode,
    UpdateOutcome, collect_params, plan_revival, run_update,
};
use partial_playground_core::snippet::partial_tag;
use partial_playground_core::theme::{ThemeApplier, resolve_initial_theme};
use partial_playground_core::viewport::ViewportController;
use partial_playground_protocol::{
    PartialNode, RenderRequest, RenderResponse, Size, SurfaceCommand, ThemeChoice,
};

/// Renders the title parameter into a heading followed by an inline script.
struct EchoBackend {
    requests: RefCell<Vec<RenderRequest>>,
}

impl RenderBackend for EchoBackend {
    fn render(
        &self,
        request: RenderRequest,
    ) -> LocalBoxFuture<'static, Result<RenderResponse, RenderError>> {
        let title = match request.params().get("title") {
            Some(partial_playground_protocol::ParamValue::Text(title)) => title.clone(),
            _ => String::new(),
        };
        self.requests.borrow_mut().push(request);
        async move {
            Ok(RenderResponse::with_html(format!(
                "<h1>{title}</h1><script>const ready = true;</script>"
            )))
        }
        .boxed_local()
    }
}

fn listing() -> Vec<PartialNode> {
    serde_json::from_str(
        r#"[
            {"type": "folder", "key": "cards", "name": "Cards", "children": [
                {"type": "file", "key": "cards/hero", "name": "Hero"}
            ]},
            {"type": "file", "key": "footer", "name": "Footer"}
        ]"#,
    )
    .expect("listing fixture must parse")
}

#[test]
fn edit_render_fit_and_theme() {
    let config = PlaygroundConfig::from_json(
        r#"{"debounce_ms": 250, "partials_folder": "blocks", "default_theme": "dark"}"#,
    )
    .expect("config must parse");

    // Listing and initial selection.
    let tree = listing();
    let options = flatten_partials(&tree);
    assert_eq!(options.len(), 3);
    let selected = first_selectable(&tree).expect("listing has a file");
    assert_eq!(selected, "cards/hero");

    let sync = RefCell::new(PreviewSync::new(config.debounce()));
    sync.borrow_mut().select_partial(selected);

    // A burst of edits collapses into one render of the final state.
    let ms = Duration::from_millis;
    sync.borrow_mut()
        .schedule_update(ms(0), collect_params([("title", "Hel")]));
    let deadline = sync
        .borrow_mut()
        .schedule_update(ms(100), collect_params([("title", "Hello"), ("tags[]", "a")]));
    assert_eq!(deadline.at, ms(350));
    assert_eq!(sync.borrow_mut().take_due(ms(300)), None);
    let params = sync
        .borrow_mut()
        .fire(deadline.ticket)
        .expect("latest edit is due");

    let backend = EchoBackend {
        requests: RefCell::new(Vec::new()),
    };
    let outcome = futures::executor::block_on(run_update(&sync, &backend, params.clone()));
    let html = match outcome {
        UpdateOutcome::Rendered(html) => html,
        other => panic!("expected rendered markup, got {other:?}"),
    };
    assert!(html.starts_with("<h1>Hello</h1>"));
    assert_eq!(backend.requests.borrow().len(), 1);

    // The adapter snapshots the page after swapping the markup in.
    let snapshot = DocumentSnapshot {
        scripts: vec![ScriptNode {
            id: ScriptId(0),
            src: None,
            text: "const ready = true;".into(),
            in_content_region: true,
            user_supplied: false,
        }],
    };
    let plan = plan_revival(&snapshot);
    assert!(matches!(
        &plan.steps[..],
        [ReviveStep::Inline { code, .. }] if code.starts_with("(function(){")
    ));

    // Fit the rendered content into the frame.
    let mut viewport = ViewportController::new(config.zoom.clone());
    viewport.set_window_size(Size::new(840.0, 580.0));
    viewport.set_content_size(Size::new(1600.0, 1000.0));
    let commands = viewport.fit_to_window();
    assert_eq!(
        commands.last(),
        Some(&SurfaceCommand::SetZoomLabel { text: "50%".into() })
    );

    // No remembered choice, so the configured default applies.
    let theme = resolve_initial_theme(Some("session=1"), config.default_theme, ThemeChoice::Light);
    assert_eq!(theme, ThemeChoice::Dark);
    let applier = ThemeApplier::new(config.theme.clone());
    let toggled = applier.apply(theme.other(), true);
    assert!(matches!(
        toggled.last(),
        Some(SurfaceCommand::WriteCookie { cookie }) if cookie.value == "light"
    ));

    // Copy code reproduces the rendered state.
    let tag = partial_tag(config.partials_folder.as_deref(), selected, &params);
    assert_eq!(
        tag,
        "{% partial 'blocks/cards/hero'\n\ttitle = 'Hello'\n\ttags = ['a']\n%}"
    );
}
