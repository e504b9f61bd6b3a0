//! Bridges to the backend's UI helpers (`$.oc.flashMsg`, the stripe load
//! indicator). Pages without them fall back to the console.

use js_sys::{Object, Reflect};
use partial_playground_core::preview::{Notice, NoticeLevel};

use crate::js::call;

pub fn show(notice: Notice) {
    let class = match notice.level {
        NoticeLevel::Success => "success",
        NoticeLevel::Error => "error",
    };
    let options = Object::new();
    let filled = Reflect::set(&options, &"text".into(), &notice.text.into())
        .and_then(|_| Reflect::set(&options, &"class".into(), &class.into()))
        .unwrap_or(false);
    if filled && call(&["$", "oc", "flashMsg"], &[options.into()]) {
        return;
    }
    match notice.level {
        NoticeLevel::Success => gloo::console::info!(notice.text),
        NoticeLevel::Error => gloo::console::error!(notice.text),
    }
}

/// Toggle the backend's page-level progress indicator.
pub fn loading(active: bool) {
    let method = if active { "show" } else { "hide" };
    call(&["$", "oc", "stripeLoadIndicator", method], &[]);
}
