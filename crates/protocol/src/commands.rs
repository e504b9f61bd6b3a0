use serde::{Deserialize, Serialize};

use crate::theme::ThemeChoice;
use crate::types::Point;

/// A single, stateless DOM instruction.
///
/// The core emits a `Vec<SurfaceCommand>` for each operation. The browser
/// adapter executes the list sequentially; each command carries all the data
/// it needs, so the same list can be asserted on in tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurfaceCommand {
    /// Translate then scale the content wrapper.
    SetContentTransform { translate: Point, scale: f64 },

    /// Update the zoom percentage readout.
    SetZoomLabel { text: String },

    /// Pointer cursor over the interactive surface.
    SetCursor { cursor: Cursor },

    AddClass { selector: String, class: String },

    RemoveClass { selector: String, class: String },

    SetAttribute {
        selector: String,
        name: String,
        value: String,
    },

    RemoveAttribute { selector: String, name: String },

    /// Record the active theme on the document root (`data-color-mode`).
    SetColorMode { mode: ThemeChoice },

    WriteCookie { cookie: Cookie },

    /// Replace the markup of the preview's content region.
    ReplaceContent { html: String },
}

impl SurfaceCommand {
    /// CSS `transform` value for a content transform.
    pub fn transform_css(translate: Point, scale: f64) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            translate.x, translate.y, scale
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cursor {
    Auto,
    Grab,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Auto => "auto",
            Cursor::Grab => "grab",
        }
    }
}

/// A client-side cookie write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub max_age_secs: u64,
    pub path: String,
}

impl Cookie {
    /// Value suitable for assigning to `document.cookie`.
    pub fn to_header_value(&self) -> String {
        format!(
            "{}={}; max-age={}; path={}",
            self.name, self.value, self.max_age_secs, self.path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_css_translates_before_scaling() {
        assert_eq!(
            SurfaceCommand::transform_css(Point::new(120.0, 40.5), 0.48),
            "translate(120px, 40.5px) scale(0.48)"
        );
    }

    #[test]
    fn cookie_header_value() {
        let cookie = Cookie {
            name: "iframe_color_mode_user".into(),
            value: "dark".into(),
            max_age_secs: 2_592_000,
            path: "/".into(),
        };
        assert_eq!(
            cookie.to_header_value(),
            "iframe_color_mode_user=dark; max-age=2592000; path=/"
        );
    }
}
