//! Executes core output against a live document.

use anyhow::{Context, anyhow};
use partial_playground_core::preview::{
    DocumentSnapshot, EventTarget, LifecycleEvent, ScriptId, ScriptNode, ScriptRunner,
    USER_SCRIPT_ATTR, execute_revival, plan_revival, prepare_external,
};
use partial_playground_protocol::SurfaceCommand;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, EventInit, HtmlDocument, HtmlElement, HtmlScriptElement};

use crate::backend::fetch_script;

pub const CONTENT_WRAPPER: &str = "#content-wrapper";
pub const ZOOM_LABEL: &str = "#text-toolbar-zoom";
pub const PAN_SURFACE: &str = "#iframe-container";
const COLOR_MODE_ATTR: &str = "data-color-mode";

pub fn element(document: &Document, selector: &str) -> Option<Element> {
    document.query_selector(selector).ok().flatten()
}

fn html_element(document: &Document, selector: &str) -> Option<HtmlElement> {
    element(document, selector).and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

fn js_err(context: &'static str) -> impl FnOnce(wasm_bindgen::JsValue) -> anyhow::Error {
    move |value| anyhow!("{context}: {value:?}")
}

/// A document the core's commands are executed against.
#[derive(Debug, Clone)]
pub struct Surface {
    document: Document,
}

impl Surface {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Execute `commands` in order. Commands whose target element is missing
    /// are skipped.
    pub fn execute(&self, commands: &[SurfaceCommand]) -> anyhow::Result<()> {
        for command in commands {
            self.execute_one(command)?;
        }
        Ok(())
    }

    fn execute_one(&self, command: &SurfaceCommand) -> anyhow::Result<()> {
        let doc = &self.document;
        match command {
            SurfaceCommand::SetContentTransform { translate, scale } => {
                if let Some(wrapper) = html_element(doc, CONTENT_WRAPPER) {
                    wrapper
                        .style()
                        .set_property("transform", &SurfaceCommand::transform_css(*translate, *scale))
                        .map_err(js_err("set transform"))?;
                }
            }
            SurfaceCommand::SetZoomLabel { text } => {
                if let Some(label) = element(doc, ZOOM_LABEL) {
                    label.set_text_content(Some(text));
                }
            }
            SurfaceCommand::SetCursor { cursor } => {
                if let Some(surface) = html_element(doc, PAN_SURFACE) {
                    surface
                        .style()
                        .set_property("cursor", cursor.as_css())
                        .map_err(js_err("set cursor"))?;
                }
            }
            SurfaceCommand::AddClass { selector, class } => {
                if let Some(el) = element(doc, selector) {
                    el.class_list().add_1(class).map_err(js_err("add class"))?;
                }
            }
            SurfaceCommand::RemoveClass { selector, class } => {
                if let Some(el) = element(doc, selector) {
                    el.class_list().remove_1(class).map_err(js_err("remove class"))?;
                }
            }
            SurfaceCommand::SetAttribute {
                selector,
                name,
                value,
            } => {
                if let Some(el) = element(doc, selector) {
                    el.set_attribute(name, value).map_err(js_err("set attribute"))?;
                }
            }
            SurfaceCommand::RemoveAttribute { selector, name } => {
                if let Some(el) = element(doc, selector) {
                    el.remove_attribute(name).map_err(js_err("remove attribute"))?;
                }
            }
            SurfaceCommand::SetColorMode { mode } => {
                if let Some(root) = doc.document_element() {
                    root.set_attribute(COLOR_MODE_ATTR, mode.as_str())
                        .map_err(js_err("set color mode"))?;
                }
            }
            SurfaceCommand::WriteCookie { cookie } => {
                let html = doc
                    .dyn_ref::<HtmlDocument>()
                    .context("cookies need an HTML document")?;
                html.set_cookie(&cookie.to_header_value())
                    .map_err(js_err("write cookie"))?;
            }
            SurfaceCommand::ReplaceContent { html } => {
                let wrapper = element(doc, CONTENT_WRAPPER).context("preview has no content region")?;
                wrapper.set_inner_html(html);
                self.revive_scripts()?;
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> anyhow::Result<(DocumentSnapshot, Vec<HtmlScriptElement>)> {
        let list = self
            .document
            .query_selector_all("script")
            .map_err(js_err("list scripts"))?;
        let mut scripts = Vec::new();
        let mut elements = Vec::new();
        for index in 0..list.length() {
            let Some(script) = list
                .item(index)
                .and_then(|node| node.dyn_into::<HtmlScriptElement>().ok())
            else {
                continue;
            };
            scripts.push(ScriptNode {
                id: ScriptId(elements.len()),
                src: Some(script.src()),
                text: script.text_content().unwrap_or_default(),
                in_content_region: script.closest(CONTENT_WRAPPER).ok().flatten().is_some(),
                user_supplied: script.has_attribute(USER_SCRIPT_ATTR),
            });
            elements.push(script);
        }
        Ok((DocumentSnapshot { scripts }, elements))
    }

    /// Re-execute the preview's scripts after its markup was replaced, then
    /// replay the page lifecycle events. Failing scripts are logged and
    /// skipped.
    pub fn revive_scripts(&self) -> anyhow::Result<()> {
        let (snapshot, elements) = self.snapshot()?;
        let mut runner = DomRunner {
            surface: self,
            elements,
        };
        for err in execute_revival(plan_revival(&snapshot), &mut runner) {
            gloo::console::error!(format!("script revival: {err:#}"));
        }
        Ok(())
    }

    fn replace_script(&self, old: &HtmlScriptElement, code: &str) -> anyhow::Result<()> {
        let fresh = self
            .document
            .create_element("script")
            .map_err(js_err("create script"))?;
        fresh
            .set_attribute(USER_SCRIPT_ATTR, "true")
            .map_err(js_err("mark script"))?;
        fresh.set_text_content(Some(code));
        old.replace_with_with_node_1(&fresh)
            .map_err(js_err("replace script"))?;
        Ok(())
    }
}

/// Carries out a revival plan against the scripts of one snapshot.
struct DomRunner<'a> {
    surface: &'a Surface,
    elements: Vec<HtmlScriptElement>,
}

impl ScriptRunner for DomRunner<'_> {
    type Error = anyhow::Error;

    fn run_inline(&mut self, script: ScriptId, code: &str) -> anyhow::Result<()> {
        match self.elements.get(script.0) {
            Some(old) => self.surface.replace_script(old, code),
            None => Ok(()),
        }
    }

    fn load_external(&mut self, script: ScriptId, src: &str) {
        let Some(old) = self.elements.get(script.0).cloned() else {
            return;
        };
        let surface = self.surface.clone();
        let src = src.to_string();
        spawn_local(async move {
            let revived = match fetch_script(&src).await {
                Ok(code) => surface.replace_script(&old, &prepare_external(&code)),
                Err(err) => Err(err),
            };
            if let Err(err) = revived {
                gloo::console::error!(format!("external script reload failed ({src}): {err:#}"));
            }
        });
    }

    fn dispatch(&mut self, event: LifecycleEvent) -> anyhow::Result<()> {
        let init = EventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        let dom_event = Event::new_with_event_init_dict(event.name(), &init)
            .map_err(js_err("create lifecycle event"))?;
        let document = &self.surface.document;
        match event.target() {
            EventTarget::Document => {
                document
                    .dispatch_event(&dom_event)
                    .map_err(js_err("dispatch on document"))?;
            }
            EventTarget::Window => {
                if let Some(window) = document.default_view() {
                    window
                        .dispatch_event(&dom_event)
                        .map_err(js_err("dispatch on window"))?;
                }
            }
        }
        Ok(())
    }
}
