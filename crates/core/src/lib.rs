//! Host-independent logic for the partial playground: keeping the preview in
//! step with the parameter form, the zoom/pan viewport, theming and the
//! partial selector. Everything that touches a page is described as
//! [`partial_playground_protocol::SurfaceCommand`]s for an adapter to execute.

pub mod config;
pub mod partials;
pub mod preview;
pub mod snippet;
pub mod theme;
pub mod viewport;

pub use config::{ConfigError, PlaygroundConfig, ZoomConfig};
pub use viewport::{PanMode, ViewportAction, ViewportController, ViewportState, ZoomDirection};
