//! Inside the preview iframe: zoom, pan and the theme toolbar.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions};
use partial_playground_core::theme::{ThemeApplier, resolve_initial_theme};
use partial_playground_core::viewport::{PanMode, ViewportAction, ViewportController, pan_cursor};
use partial_playground_core::{PlaygroundConfig, ViewportState};
use partial_playground_protocol::{DefaultTheme, Point, Size, SurfaceCommand, ThemeChoice};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, Event, HtmlDocument, HtmlInputElement, KeyboardEvent, MouseEvent, Window};

use crate::dom::{CONTENT_WRAPPER, PAN_SURFACE, Surface, element};

const THEME_RADIOS: &str = r#"#radio-toolbar-theme input[name="theme"]"#;
const PAN_RADIOS: &str = r#"#radio-toolbar-pan input[name="pan"]"#;
const CHECKED_PAN: &str = "#radio-toolbar-pan input:checked";
const ZOOM_BUTTONS: [(&str, ViewportAction); 3] = [
    ("#button-toolbar-zoom-in", ViewportAction::ZoomIn),
    ("#button-toolbar-zoom-out", ViewportAction::ZoomOut),
    ("#button-toolbar-zoom-fit", ViewportAction::ZoomToFit),
];
/// Server-provided initial theme, when the page sets one.
const INITIAL_THEME_GLOBAL: &str = "previewColorMode";

pub struct Frame {
    window: Window,
    surface: Surface,
    viewport: RefCell<ViewportController>,
    theme: ThemeApplier,
    default_theme: DefaultTheme,
}

impl Frame {
    pub fn new(window: Window, config: &PlaygroundConfig) -> anyhow::Result<Rc<Self>> {
        let document = window
            .document()
            .ok_or_else(|| anyhow::anyhow!("frame has no document"))?;
        Ok(Rc::new(Self {
            window,
            surface: Surface::new(document),
            viewport: RefCell::new(ViewportController::new(config.zoom.clone())),
            theme: ThemeApplier::new(config.theme.clone()),
            default_theme: config.default_theme,
        }))
    }

    /// First paint: resolved theme (not persisted), cursor and fit.
    pub fn init(&self) {
        self.apply_theme(self.initial_theme(), false);
        self.run(vec![pan_cursor(self.pan_mode())]);
        self.perform(ViewportAction::ZoomToFit);
    }

    pub fn state(&self) -> ViewportState {
        self.viewport.borrow().state()
    }

    fn run(&self, commands: Vec<SurfaceCommand>) {
        if let Err(err) = self.surface.execute(&commands) {
            gloo::console::error!(format!("preview surface update failed: {err:#}"));
        }
    }

    fn sync_geometry(&self) {
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or_default()
        };
        let window = Size::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        );
        let content = element(self.surface.document(), CONTENT_WRAPPER)
            .map(|el| Size::new(f64::from(el.scroll_width()), f64::from(el.scroll_height())))
            .unwrap_or_default();
        let mut viewport = self.viewport.borrow_mut();
        viewport.set_window_size(window);
        viewport.set_content_size(content);
    }

    pub fn perform(&self, action: ViewportAction) {
        self.sync_geometry();
        let commands = self.viewport.borrow_mut().perform(action);
        self.run(commands);
    }

    pub fn apply_theme(&self, choice: ThemeChoice, persist: bool) {
        self.run(self.theme.apply(choice, persist));
    }

    /// Read at call time so the toolbar is the single source of truth.
    fn pan_mode(&self) -> PanMode {
        element(self.surface.document(), CHECKED_PAN)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.value().parse().ok())
            .unwrap_or_default()
    }

    fn initial_theme(&self) -> ThemeChoice {
        let injected = js_sys::Reflect::get(&self.window, &JsValue::from_str(INITIAL_THEME_GLOBAL))
            .ok()
            .and_then(|value| value.as_string())
            .and_then(|value| value.parse().ok());
        if let Some(choice) = injected {
            return choice;
        }
        let cookies = self
            .surface
            .document()
            .dyn_ref::<HtmlDocument>()
            .and_then(|doc| doc.cookie().ok());
        resolve_initial_theme(cookies.as_deref(), self.default_theme, self.system_theme())
    }

    fn system_theme(&self) -> ThemeChoice {
        let dark = self
            .window
            .match_media("(prefers-color-scheme: dark)")
            .ok()
            .flatten()
            .is_some_and(|query| query.matches());
        if dark { ThemeChoice::Dark } else { ThemeChoice::Light }
    }

    pub fn listen(self: &Rc<Self>) -> Vec<EventListener> {
        let document = self.surface.document().clone();
        let mut listeners = Vec::new();

        let frame = Rc::downgrade(self);
        listeners.push(EventListener::new(&document, "change", move |event| {
            let (Some(frame), Some(target)) = (frame.upgrade(), event_element(event)) else {
                return;
            };
            if target.matches(THEME_RADIOS).unwrap_or(false) {
                let choice = target
                    .dyn_ref::<HtmlInputElement>()
                    .and_then(|input| input.value().parse::<ThemeChoice>().ok());
                if let Some(choice) = choice {
                    frame.apply_theme(choice, true);
                }
            } else if target.matches(PAN_RADIOS).unwrap_or(false) {
                frame.run(vec![pan_cursor(frame.pan_mode())]);
            }
        }));

        for (selector, action) in ZOOM_BUTTONS {
            let Some(button) = element(&document, selector) else {
                continue;
            };
            let frame = Rc::downgrade(self);
            listeners.push(EventListener::new(&button, "click", move |_| {
                if let Some(frame) = frame.upgrade() {
                    frame.perform(action);
                }
            }));
        }

        let frame = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.window, "resize", move |_| {
            if let Some(frame) = frame.upgrade() {
                frame.perform(ViewportAction::ZoomToFit);
            }
        }));

        let frame = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &self.window,
            "keydown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(frame) = frame.upgrade() else {
                    return;
                };
                let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                if key.ctrl_key() || key.meta_key() || key.alt_key() || typing_into(event) {
                    return;
                }
                if let Some(action) = ViewportAction::from_key(&key.key()) {
                    event.prevent_default();
                    frame.perform(action);
                }
            },
        ));

        if let Some(surface) = element(&document, PAN_SURFACE) {
            listeners.extend(self.listen_pan(&surface));
        }
        listeners
    }

    fn listen_pan(self: &Rc<Self>, surface: &Element) -> Vec<EventListener> {
        let mut listeners = Vec::new();

        let frame = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            surface,
            "mousedown",
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let (Some(frame), Some(pointer)) = (frame.upgrade(), pointer_position(event)) else {
                    return;
                };
                let mode = frame.pan_mode();
                if frame.viewport.borrow_mut().begin_pan(pointer, mode) {
                    event.prevent_default();
                }
            },
        ));

        let frame = Rc::downgrade(self);
        listeners.push(EventListener::new(surface, "mousemove", move |event| {
            let (Some(frame), Some(pointer)) = (frame.upgrade(), pointer_position(event)) else {
                return;
            };
            let commands = frame.viewport.borrow_mut().continue_pan(pointer);
            frame.run(commands);
        }));

        for event_type in ["mouseup", "mouseleave"] {
            let frame = Rc::downgrade(self);
            listeners.push(EventListener::new(surface, event_type, move |_| {
                if let Some(frame) = frame.upgrade() {
                    frame.viewport.borrow_mut().end_pan();
                }
            }));
        }
        listeners
    }
}

fn event_element(event: &Event) -> Option<Element> {
    event.target().and_then(|t| t.dyn_into::<Element>().ok())
}

fn pointer_position(event: &Event) -> Option<Point> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    Some(Point::new(
        f64::from(mouse.client_x()),
        f64::from(mouse.client_y()),
    ))
}

/// Shortcuts stay inactive while the user types into a field of the preview.
fn typing_into(event: &Event) -> bool {
    event_element(event).is_some_and(|el| {
        matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
            || el.has_attribute("contenteditable")
    })
}
