mod backend;
mod dom;
mod frame;
mod host;
mod js;
mod notify;
mod widgets;

use std::rc::Rc;

use gloo::events::EventListener;
use partial_playground_core::PlaygroundConfig;
use partial_playground_core::viewport::ViewportAction;
use partial_playground_protocol::{PartialNode, ThemeChoice};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

fn js_error(err: &anyhow::Error) -> JsError {
    JsError::new(&format!("{err:#}"))
}

fn load_config(config_json: &str) -> Result<PlaygroundConfig, JsError> {
    PlaygroundConfig::from_json(config_json).map_err(|e| JsError::new(&e.to_string()))
}

fn window() -> Result<web_sys::Window, JsError> {
    web_sys::window().ok_or_else(|| JsError::new("no window"))
}

/// Host page controller: parameter form, partial selector, reset and
/// copy-code. Listeners are removed when the object is freed.
#[wasm_bindgen]
pub struct PreviewHost {
    host: Rc<host::Host>,
    _listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl PreviewHost {
    /// `config_json` may be empty for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<PreviewHost, JsError> {
        let config = load_config(config_json)?;
        let document = window()?
            .document()
            .ok_or_else(|| JsError::new("no document"))?;
        let host = host::Host::new(document, config).map_err(|e| js_error(&e))?;
        let listeners = host.listen();
        host.bind_widgets();
        Ok(PreviewHost {
            host,
            _listeners: listeners,
        })
    }

    #[wasm_bindgen(getter, js_name = selectedPartial)]
    pub fn selected_partial(&self) -> Option<String> {
        self.host.partial()
    }

    /// Fill the partial selector from a JSON listing of files and folders.
    /// Returns the selected partial key.
    #[wasm_bindgen(js_name = renderPartialSelect)]
    pub fn render_partial_select(&self, listing_json: &str) -> Result<Option<String>, JsError> {
        let tree: Vec<PartialNode> =
            serde_json::from_str(listing_json).map_err(|e| JsError::new(&e.to_string()))?;
        self.host
            .render_partial_select(&tree)
            .map_err(|e| js_error(&e))
    }

    /// Restore the partial's default values and re-render the preview.
    pub fn reset(&self) {
        spawn_local(host::reset(self.host.clone()));
    }

    #[wasm_bindgen(js_name = copyCode)]
    pub fn copy_code(&self) {
        spawn_local(self.host.clone().copy_code());
    }
}

/// Preview iframe controller: zoom, pan and theme toolbar.
#[wasm_bindgen]
pub struct PreviewFrame {
    frame: Rc<frame::Frame>,
    _listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl PreviewFrame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<PreviewFrame, JsError> {
        let config = load_config(config_json)?;
        let frame = frame::Frame::new(window()?, &config).map_err(|e| js_error(&e))?;
        frame.init();
        let listeners = frame.listen();
        Ok(PreviewFrame {
            frame,
            _listeners: listeners,
        })
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        self.frame.perform(ViewportAction::ZoomIn);
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        self.frame.perform(ViewportAction::ZoomOut);
    }

    #[wasm_bindgen(js_name = zoomToFit)]
    pub fn zoom_to_fit(&self) {
        self.frame.perform(ViewportAction::ZoomToFit);
    }

    /// Switch theme as an explicit user choice (remembered in a cookie).
    #[wasm_bindgen(js_name = applyTheme)]
    pub fn apply_theme(&self, choice: &str) -> Result<(), JsError> {
        let choice: ThemeChoice = choice.parse()?;
        self.frame.apply_theme(choice, true);
        Ok(())
    }

    /// Current transform as JSON (`scale`, `offset_x`, `offset_y`).
    pub fn state(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.frame.state()).map_err(|e| JsError::new(&e.to_string()))
    }
}
