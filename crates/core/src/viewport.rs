//! Pan/zoom controller for the preview surface.
//!
//! The controller owns a translate+scale transform applied to the content
//! wrapper. Every mutating operation returns the [`SurfaceCommand`]s that
//! project the new state onto the page; an empty list means nothing changed.

use std::str::FromStr;

use partial_playground_protocol::{Cursor, Point, Size, SurfaceCommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ZoomConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Interaction mode of the pointer over the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanMode {
    /// Pointer interacts with the content (text selection, links).
    #[default]
    Cursor,
    /// Pointer drags the content around.
    Grab,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pan mode `{0}`, expected `cursor` or `grab`")]
pub struct ParsePanModeError(pub String);

impl FromStr for PanMode {
    type Err = ParsePanModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cursor" => Ok(PanMode::Cursor),
            "grab" => Ok(PanMode::Grab),
            other => Err(ParsePanModeError(other.to_string())),
        }
    }
}

/// Toolbar or keyboard request routed to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportAction {
    ZoomIn,
    ZoomOut,
    ZoomToFit,
}

impl ViewportAction {
    /// Keyboard shortcut mapping (`KeyboardEvent.key`).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "+" | "=" => Some(ViewportAction::ZoomIn),
            "-" | "_" => Some(ViewportAction::ZoomOut),
            "0" => Some(ViewportAction::ZoomToFit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewportState {
    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewportState,
    zoom: ZoomConfig,
    /// Visible window size; its center is the zoom anchor.
    window: Size,
    /// Natural (unscaled) size of the content.
    content: Size,
    /// Last pointer position while dragging.
    drag_last: Option<Point>,
}

impl ViewportController {
    pub fn new(zoom: ZoomConfig) -> Self {
        Self::with_state(zoom, ViewportState::default())
    }

    /// Start from an explicit state. The scale is clamped into the
    /// configured bounds.
    pub fn with_state(zoom: ZoomConfig, mut state: ViewportState) -> Self {
        state.scale = state.scale.clamp(zoom.min_scale, zoom.max_scale);
        Self {
            state,
            zoom,
            window: Size::default(),
            content: Size::default(),
            drag_last: None,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn set_window_size(&mut self, size: Size) {
        self.window = size;
    }

    pub fn set_content_size(&mut self, size: Size) {
        self.content = size;
    }

    /// Rounded zoom readout, in percent.
    pub fn zoom_percent(&self) -> i64 {
        (self.state.scale * 100.0).round() as i64
    }

    /// Project the current state onto the content wrapper and the zoom
    /// readout.
    pub fn apply_transform(&self) -> Vec<SurfaceCommand> {
        vec![
            SurfaceCommand::SetContentTransform {
                translate: self.state.offset(),
                scale: self.state.scale,
            },
            SurfaceCommand::SetZoomLabel {
                text: format!("{}%", self.zoom_percent()),
            },
        ]
    }

    /// Scale the content to fit the window (never above 100%) and center it.
    pub fn fit_to_window(&mut self) -> Vec<SurfaceCommand> {
        if self.content.is_degenerate() {
            tracing::debug!(content = ?self.content, "skipping fit for empty content");
            return Vec::new();
        }

        let available_w = self.window.width - self.zoom.margin_x;
        let available_h = self.window.height - self.zoom.margin_y;
        let scale = (available_w / self.content.width)
            .min(available_h / self.content.height)
            .min(1.0)
            .clamp(self.zoom.min_scale, self.zoom.max_scale);

        self.state = ViewportState {
            scale,
            offset_x: (self.window.width - self.content.width * scale) / 2.0,
            offset_y: (self.window.height - self.content.height * scale) / 2.0,
        };
        self.apply_transform()
    }

    pub fn zoom_to_fit(&mut self) -> Vec<SurfaceCommand> {
        self.fit_to_window()
    }

    /// Zoom one step around the window center.
    ///
    /// Off-grid scales (e.g. after a fit) snap to the neighbouring grid value
    /// in the requested direction instead of moving by a full step.
    pub fn step_zoom(&mut self, direction: ZoomDirection) -> Vec<SurfaceCommand> {
        let center = self.window.center();
        let scale = self.state.scale;
        let anchor = Point::new(
            (center.x - self.state.offset_x) / scale,
            (center.y - self.state.offset_y) / scale,
        );

        let target = next_grid_percent(self.zoom_percent(), direction, self.zoom.step_percent);
        let percent =
            (target as f64).clamp(self.zoom.min_scale * 100.0, self.zoom.max_scale * 100.0);
        let new_scale = (percent / 100.0).clamp(self.zoom.min_scale, self.zoom.max_scale);

        self.state = ViewportState {
            scale: new_scale,
            offset_x: center.x - anchor.x * new_scale,
            offset_y: center.y - anchor.y * new_scale,
        };
        self.apply_transform()
    }

    pub fn zoom_in(&mut self) -> Vec<SurfaceCommand> {
        self.step_zoom(ZoomDirection::In)
    }

    pub fn zoom_out(&mut self) -> Vec<SurfaceCommand> {
        self.step_zoom(ZoomDirection::Out)
    }

    pub fn perform(&mut self, action: ViewportAction) -> Vec<SurfaceCommand> {
        match action {
            ViewportAction::ZoomIn => self.zoom_in(),
            ViewportAction::ZoomOut => self.zoom_out(),
            ViewportAction::ZoomToFit => self.zoom_to_fit(),
        }
    }

    /// Start dragging. Ignored unless `mode` is [`PanMode::Grab`]; returns
    /// whether a drag started so the caller can suppress the default action.
    pub fn begin_pan(&mut self, pointer: Point, mode: PanMode) -> bool {
        if mode != PanMode::Grab {
            return false;
        }
        self.drag_last = Some(pointer);
        true
    }

    /// Move the content by the pointer delta, in screen pixels.
    pub fn continue_pan(&mut self, pointer: Point) -> Vec<SurfaceCommand> {
        let Some(last) = self.drag_last else {
            return Vec::new();
        };
        self.state.offset_x += pointer.x - last.x;
        self.state.offset_y += pointer.y - last.y;
        self.drag_last = Some(pointer);
        self.apply_transform()
    }

    pub fn end_pan(&mut self) {
        self.drag_last = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_last.is_some()
    }
}

/// Cursor reflecting the pan mode.
pub fn pan_cursor(mode: PanMode) -> SurfaceCommand {
    let cursor = match mode {
        PanMode::Grab => Cursor::Grab,
        PanMode::Cursor => Cursor::Auto,
    };
    SurfaceCommand::SetCursor { cursor }
}

fn next_grid_percent(current: i64, direction: ZoomDirection, step: u32) -> i64 {
    let step = i64::from(step.max(1));
    let on_grid = current.rem_euclid(step) == 0;
    match (direction, on_grid) {
        (ZoomDirection::In, true) => current + step,
        (ZoomDirection::Out, true) => current - step,
        (ZoomDirection::In, false) => (current.div_euclid(step) + 1) * step,
        (ZoomDirection::Out, false) => current.div_euclid(step) * step,
    }
}
