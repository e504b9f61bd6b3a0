//! Host page side: parameter form, partial selector, reset and copy-code.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use anyhow::{Context, anyhow};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use partial_playground_core::PlaygroundConfig;
use partial_playground_core::partials::{first_selectable, flatten_partials};
use partial_playground_core::preview::{
    FieldEvent, Notice, PreviewSync, UpdateOutcome, collect_params, run_reset, run_update,
};
use partial_playground_core::snippet::partial_tag;
use partial_playground_protocol::{ParamMap, PartialNode, SurfaceCommand};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Document, Element, FormData, HtmlFormElement, HtmlIFrameElement, HtmlInputElement,
    HtmlSelectElement,
};

use crate::backend::{
    HandlerClient, HandlerResponse, ON_CHANGE_PARTIAL, ON_RESET_PREVIEW, PartialSelection,
};
use crate::dom::{Surface, element};
use crate::widgets::{OnEdit, Widgets};
use crate::{js, notify};

pub const FORM: &str = "#Form-partialForm";
pub const PARTIAL_SELECT_ID: &str = "partial-select";
const SELECTED_PARTIAL: &str = "#selected-partial";
const PREVIEW_IFRAME: &str = "#preview-iframe";
/// Fragment holding the preview iframe. Reset keeps the live iframe and
/// re-renders into it instead.
const PREVIEW_FRAGMENT: &str = "#preview-content";
/// Value lockers of backend widgets; their edits arrive through [`Widgets`].
const IGNORED_FIELDS: &str =
    r#"input[type="hidden"], input[data-datepicker], input[data-timepicker]"#;

pub struct Host {
    document: Document,
    config: PlaygroundConfig,
    client: HandlerClient,
    sync: RefCell<PreviewSync>,
    timer: RefCell<Option<Timeout>>,
    widgets: RefCell<Option<Widgets>>,
}

impl Host {
    pub fn new(document: Document, config: PlaygroundConfig) -> anyhow::Result<Rc<Self>> {
        let client = HandlerClient::for_document(&document)?;
        let mut sync = PreviewSync::new(config.debounce());
        if let Some(partial) = selected_partial(&document) {
            sync.select_partial(partial);
        }
        Ok(Rc::new(Self {
            document,
            config,
            client,
            sync: RefCell::new(sync),
            timer: RefCell::new(None),
            widgets: RefCell::new(None),
        }))
    }

    pub fn partial(&self) -> Option<String> {
        self.sync.borrow().partial().map(str::to_string)
    }

    /// Delegated listeners on the document, so fragments swapped in by the
    /// backend stay wired without rebinding.
    pub fn listen(self: &Rc<Self>) -> Vec<EventListener> {
        let mut listeners = Vec::new();
        for event_type in ["input", "change"] {
            let host = Rc::downgrade(self);
            listeners.push(EventListener::new(&self.document, event_type, move |event| {
                let Some(host) = host.upgrade() else {
                    return;
                };
                let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok())
                else {
                    return;
                };
                if event.type_() == "change" && target.id() == PARTIAL_SELECT_ID {
                    if let Ok(select) = target.dyn_into::<HtmlSelectElement>() {
                        let key = select.value();
                        spawn_local(change_partial(host, key));
                    }
                    return;
                }
                if is_form_field(&target) && reports_edit(&target, &event.type_()) {
                    host.schedule_update();
                }
            }));
        }
        listeners
    }

    /// Hook the backend widgets of the current form, replacing the hooks of
    /// an earlier form.
    pub fn bind_widgets(self: &Rc<Self>) {
        self.widgets.replace(None);
        let Some(form) = element(&self.document, FORM) else {
            return;
        };
        let host = Rc::downgrade(self);
        let on_edit: OnEdit = Rc::new(move || {
            if let Some(host) = host.upgrade() {
                host.schedule_update();
            }
        });
        self.widgets.replace(Some(Widgets::bind(&form, &on_edit)));
    }

    fn form_params(&self) -> ParamMap {
        element(&self.document, FORM)
            .and_then(|form| form.dyn_into::<HtmlFormElement>().ok())
            .and_then(|form| FormData::new_with_form(&form).ok())
            .map(|data| collect_params(form_entries(&data)))
            .unwrap_or_default()
    }

    /// Debounce a form edit; the timer only fires for the latest edit.
    fn schedule_update(self: &Rc<Self>) {
        let params = self.form_params();
        let deadline = self.sync.borrow_mut().schedule_update(now(), params);
        let delay = self.sync.borrow().debounce_delay();

        let host: Weak<Self> = Rc::downgrade(self);
        let timer = Timeout::new(millis(delay), move || {
            let Some(host) = host.upgrade() else {
                return;
            };
            let due = host.sync.borrow_mut().fire(deadline.ticket);
            if let Some(params) = due {
                spawn_local(update(host, params));
            }
        });
        self.timer.replace(Some(timer));
    }

    fn cancel_pending(&self) {
        self.timer.replace(None);
        self.sync.borrow_mut().cancel_all();
    }

    fn frame_surface(&self) -> Option<Surface> {
        element(&self.document, PREVIEW_IFRAME)
            .and_then(|el| el.dyn_into::<HtmlIFrameElement>().ok())
            .and_then(|iframe| iframe.content_document())
            .map(Surface::new)
    }

    /// Apply a handled outcome to the preview. Returns whether the request
    /// completed (rendered or unchanged).
    fn settle(&self, outcome: &UpdateOutcome, success: Notice) -> bool {
        match outcome {
            UpdateOutcome::Rendered(html) => {
                let Some(surface) = self.frame_surface() else {
                    gloo::console::warn!("preview frame is not ready");
                    return false;
                };
                let command = SurfaceCommand::ReplaceContent { html: html.clone() };
                if let Err(err) = surface.execute(&[command]) {
                    gloo::console::error!(format!("preview update failed: {err:#}"));
                }
                notify::show(success);
                true
            }
            UpdateOutcome::Unchanged => true,
            UpdateOutcome::Superseded => false,
            UpdateOutcome::Failed(_) => {
                notify::show(Notice::PREVIEW_UPDATE_FAILED);
                false
            }
        }
    }

    /// Swap in the response fragments, then rewire the form: widget hooks
    /// first, then the backend's `render` event so it initialises the new
    /// controls.
    fn apply_fragments(self: &Rc<Self>, response: &HandlerResponse, skip: Option<&str>) {
        for (selector, html) in &response.fragments {
            if Some(selector.as_str()) == skip {
                continue;
            }
            match element(&self.document, selector) {
                Some(target) => target.set_inner_html(html),
                None => gloo::console::warn!(format!("no element for fragment {selector}")),
            }
        }
        self.bind_widgets();
        let rendered = js::jquery(&self.document)
            .map(|document| js::invoke(&document, "trigger", &["render".into()]));
        if let Some(Err(err)) = rendered {
            gloo::console::warn!(format!("render event failed: {err:?}"));
        }
    }

    /// Fill the partial selector from a listing; returns the selected key.
    pub fn render_partial_select(&self, tree: &[PartialNode]) -> anyhow::Result<Option<String>> {
        let select = element(&self.document, &format!("#{PARTIAL_SELECT_ID}"))
            .context("partial selector missing")?
            .dyn_into::<HtmlSelectElement>()
            .map_err(|_| anyhow!("#{PARTIAL_SELECT_ID} is not a select"))?;
        select.set_inner_html("");

        let current = self.partial();
        for option in flatten_partials(tree) {
            let el = self
                .document
                .create_element("option")
                .map_err(|err| anyhow!("create option: {err:?}"))?;
            el.set_attribute("value", &option.key)
                .and_then(|()| el.set_attribute("title", &option.title()))
                .map_err(|err| anyhow!("option attributes: {err:?}"))?;
            if !option.selectable {
                el.set_attribute("disabled", "")
                    .map_err(|err| anyhow!("disable option: {err:?}"))?;
            }
            el.set_text_content(Some(&option.indented_label()));
            select
                .append_child(&el)
                .map_err(|err| anyhow!("append option: {err:?}"))?;
        }

        let selected = current.or_else(|| first_selectable(tree).map(str::to_string));
        if let Some(key) = &selected {
            select.set_value(key);
            if self.partial().as_deref() != Some(key.as_str()) {
                self.sync.borrow_mut().select_partial(key.clone());
            }
        }
        Ok(selected)
    }

    /// Put the current form state on the clipboard as an include tag.
    pub async fn copy_code(self: Rc<Self>) {
        let Some(partial) = self.partial() else {
            notify::show(Notice::CODE_COPY_FAILED);
            return;
        };
        let tag = partial_tag(
            self.config.partials_folder.as_deref(),
            &partial,
            &self.form_params(),
        );
        match write_clipboard(&tag).await {
            Ok(()) => notify::show(Notice::CODE_COPIED),
            Err(err) => {
                gloo::console::error!(format!("copy failed: {err:#}"));
                notify::show(Notice::CODE_COPY_FAILED);
            }
        }
    }
}

async fn update(host: Rc<Host>, params: ParamMap) {
    let outcome = run_update(&host.sync, &host.client, params).await;
    host.settle(&outcome, Notice::PREVIEW_UPDATED);
}

async fn change_partial(host: Rc<Host>, key: String) {
    host.cancel_pending();
    notify::loading(true);
    let reply = host
        .client
        .call(ON_CHANGE_PARTIAL, &PartialSelection { partial: &key })
        .await;
    notify::loading(false);
    match reply {
        Ok(response) => {
            host.apply_fragments(&response, None);
            let key = selected_partial(&host.document).unwrap_or(key);
            host.sync.borrow_mut().select_partial(key);
        }
        Err(err) => {
            gloo::console::error!(format!("partial change failed: {err}"));
            notify::show(Notice::PREVIEW_UPDATE_FAILED);
        }
    }
}

/// Restore the form defaults and re-render the preview in place.
pub async fn reset(host: Rc<Host>) {
    let Some(partial) = host.partial() else {
        return;
    };
    host.cancel_pending();
    notify::loading(true);
    let reply = host
        .client
        .call(ON_RESET_PREVIEW, &PartialSelection { partial: &partial })
        .await;
    let outcome = match reply {
        Ok(response) => {
            host.apply_fragments(&response, Some(PREVIEW_FRAGMENT));
            let defaults = host.form_params();
            Some(run_reset(&host.sync, &host.client, defaults).await)
        }
        Err(err) => {
            gloo::console::error!(format!("reset failed: {err}"));
            None
        }
    };
    notify::loading(false);
    match outcome {
        Some(outcome) => {
            if host.settle(&outcome, Notice::PARTIAL_RESET)
                && outcome == UpdateOutcome::Unchanged
            {
                notify::show(Notice::PARTIAL_RESET);
            }
        }
        None => notify::show(Notice::PREVIEW_UPDATE_FAILED),
    }
}

fn selected_partial(document: &Document) -> Option<String> {
    element(document, SELECTED_PARTIAL)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .filter(|value| !value.trim().is_empty())
}

fn is_form_field(target: &Element) -> bool {
    let in_form = target.closest(FORM).ok().flatten().is_some();
    in_form && !target.matches(IGNORED_FIELDS).unwrap_or(false)
}

/// Text fields report edits on `input` only; their `change` on blur would
/// render the same values again.
fn reports_edit(target: &Element, event_type: &str) -> bool {
    let input_type = target.get_attribute("type");
    FieldEvent::reports(&target.tag_name(), input_type.as_deref(), event_type)
}

/// Text entries of a form in document order; file inputs are skipped.
fn form_entries(data: &FormData) -> Vec<(String, String)> {
    let Ok(Some(iter)) = js_sys::try_iter(data) else {
        return Vec::new();
    };
    iter.filter_map(Result::ok)
        .filter_map(|entry| {
            let pair = entry.dyn_into::<js_sys::Array>().ok()?;
            Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
        })
        .collect()
}

async fn write_clipboard(text: &str) -> anyhow::Result<()> {
    let navigator: JsValue = web_sys::window().context("no window")?.navigator().into();
    let clipboard = js_sys::Reflect::get(&navigator, &"clipboard".into())
        .map_err(|err| anyhow!("clipboard unavailable: {err:?}"))?;
    let write = js_sys::Reflect::get(&clipboard, &"writeText".into())
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        .context("clipboard API unavailable")?;
    let promise = write
        .call1(&clipboard, &JsValue::from_str(text))
        .map_err(|err| anyhow!("writeText failed: {err:?}"))?;
    JsFuture::from(js_sys::Promise::from(promise))
        .await
        .map_err(|err| anyhow!("writeText rejected: {err:?}"))?;
    Ok(())
}

fn now() -> Duration {
    let millis = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_default();
    Duration::from_secs_f64(millis.max(0.0) / 1000.0)
}

fn millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}
