//! Live-update hooks for the backend's form widgets.
//!
//! Date and color pickers, code and rich editors and the media finder keep
//! their value in a locker element and announce edits through jQuery, ace or
//! Froala events instead of native field events. Hooks are registered with
//! the emitter's `on` and removed with `off` when [`Widgets`] is dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::timers::callback::Timeout;
use partial_playground_core::preview::{ValueGate, WidgetKind};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Element;

use crate::js;

/// Delay between attempts to reach a rich editor that is still booting.
const EDITOR_POLL_MS: u32 = 300;
const DATE_LOCKER: &str = "input[data-datetime-value]";
/// Attribute of a color picker naming its locker's selector.
const COLOR_LOCKER_ATTR: &str = "data-data-locker";
const MEDIA_LOCKER: &str = "div[data-data-locker]";
const CODE_SURFACE: &str = ".editor-code";

pub type OnEdit = Rc<dyn Fn()>;

struct Hook {
    emitter: JsValue,
    event: &'static str,
    callback: Closure<dyn FnMut()>,
}

impl Hook {
    fn bind(emitter: JsValue, event: &'static str, callback: impl FnMut() + 'static) -> Option<Self> {
        let callback = Closure::<dyn FnMut()>::new(callback);
        let args = [JsValue::from_str(event), callback.as_ref().clone()];
        match js::invoke(&emitter, "on", &args) {
            Ok(_) => Some(Self {
                emitter,
                event,
                callback,
            }),
            Err(err) => {
                gloo::console::warn!(format!("cannot listen for {event}: {err:?}"));
                None
            }
        }
    }
}

impl Drop for Hook {
    fn drop(&mut self) {
        let args = [JsValue::from_str(self.event), self.callback.as_ref().clone()];
        if let Err(err) = js::invoke(&self.emitter, "off", &args) {
            gloo::console::debug!(format!("{} hook not removed: {err:?}", self.event));
        }
    }
}

/// Hooks of one form. Dropping it unhooks every widget.
pub struct Widgets {
    hooks: Rc<RefCell<Vec<Hook>>>,
}

impl Widgets {
    /// Hook every widget inside `form`; `on_edit` runs for each edit.
    pub fn bind(form: &Element, on_edit: &OnEdit) -> Self {
        let widgets = Self {
            hooks: Rc::default(),
        };
        for kind in WidgetKind::ALL {
            for container in containers(form, kind) {
                widgets.bind_one(kind, &container, on_edit);
            }
        }
        widgets
    }

    fn keep(&self, hook: Option<Hook>) {
        if let Some(hook) = hook {
            self.hooks.borrow_mut().push(hook);
        }
    }

    fn bind_one(&self, kind: WidgetKind, container: &Element, on_edit: &OnEdit) {
        match kind {
            WidgetKind::Datepicker => {
                self.keep(gated_hook(kind, container, query(container, DATE_LOCKER), on_edit));
            }
            WidgetKind::Colorpicker => {
                let locker = container
                    .get_attribute(COLOR_LOCKER_ATTR)
                    .and_then(|selector| query(container, &selector));
                self.keep(gated_hook(kind, container, locker, on_edit));
            }
            WidgetKind::Codeeditor => self.keep(code_editor_hook(
                container,
                Rc::downgrade(&self.hooks),
                on_edit,
            )),
            WidgetKind::Richeditor => {
                poll_rich_editor(Rc::downgrade(&self.hooks), container.clone(), on_edit.clone());
            }
            WidgetKind::Mediafinder => {
                let hook = query(container, MEDIA_LOCKER).and_then(|locker| {
                    let on_edit = on_edit.clone();
                    Hook::bind(js::jquery(&locker)?, "change", move || on_edit())
                });
                self.keep(hook);
            }
        }
    }
}

/// Container hook that fires only when the locker value actually changed.
fn gated_hook(
    kind: WidgetKind,
    container: &Element,
    locker: Option<Element>,
    on_edit: &OnEdit,
) -> Option<Hook> {
    let event = kind.container_event()?;
    let locker = locker?;
    let mut gate = ValueGate::new(value_of(&locker));
    let on_edit = on_edit.clone();
    Hook::bind(js::jquery(container)?, event, move || {
        if !kind.gated() || gate.changed(&value_of(&locker)) {
            on_edit();
        }
    })
}

/// Once the editor is ready, mirror its ace session into the widget's
/// textarea on every change.
fn code_editor_hook(
    container: &Element,
    hooks: Weak<RefCell<Vec<Hook>>>,
    on_edit: &OnEdit,
) -> Option<Hook> {
    let event = WidgetKind::Codeeditor.container_event()?;
    let target = container.clone();
    let on_edit = on_edit.clone();
    Hook::bind(js::jquery(container)?, event, move || {
        let Some(hooks) = hooks.upgrade() else {
            return;
        };
        if let Some(hook) = session_hook(&target, on_edit.clone()) {
            hooks.borrow_mut().push(hook);
        }
    })
}

fn session_hook(container: &Element, on_edit: OnEdit) -> Option<Hook> {
    let textarea = query(container, "textarea")?;
    let surface = query(container, CODE_SURFACE)?;
    let (_, ace) = js::lookup(&["ace"])?;
    let editor = js::invoke(&ace, "edit", &[surface.into()]).ok()?;
    let session = js::invoke(&editor, "getSession", &[]).ok()?;
    let source = session.clone();
    Hook::bind(session, "change", move || {
        if let Ok(value) = js::invoke(&source, "getValue", &[]) {
            if js_sys::Reflect::set(&textarea, &"value".into(), &value).is_err() {
                gloo::console::warn!("code editor value not mirrored");
            }
        }
        on_edit();
    })
}

/// The rich editor boots asynchronously; retry until its Froala instance is
/// reachable or the hooks are dropped.
fn poll_rich_editor(hooks: Weak<RefCell<Vec<Hook>>>, container: Element, on_edit: OnEdit) {
    let Some(live) = hooks.upgrade() else {
        return;
    };
    if let Some(hook) = content_hook(&container, &on_edit) {
        live.borrow_mut().push(hook);
        return;
    }
    Timeout::new(EDITOR_POLL_MS, move || {
        poll_rich_editor(hooks, container, on_edit);
    })
    .forget();
}

fn content_hook(container: &Element, on_edit: &OnEdit) -> Option<Hook> {
    let instance = js::invoke(&js::jquery(container)?, "data", &["oc.richEditor".into()])
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())?;
    let editor = js::invoke(&instance, "getEditor", &[])
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())?;
    let events = js::property(&editor, "events")?;
    let on_edit = on_edit.clone();
    Hook::bind(events, "contentChanged", move || {
        // The textarea is synced after the event's own handlers.
        let on_edit = on_edit.clone();
        Timeout::new(0, move || on_edit()).forget();
    })
}

fn containers(form: &Element, kind: WidgetKind) -> Vec<Element> {
    let Ok(list) = form.query_selector_all(&kind.container_selector()) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn query(container: &Element, selector: &str) -> Option<Element> {
    container.query_selector(selector).ok().flatten()
}

fn value_of(locker: &Element) -> String {
    js::property(locker, "value")
        .and_then(|value| value.as_string())
        .unwrap_or_default()
}
