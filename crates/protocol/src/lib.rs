pub mod commands;
pub mod partials;
pub mod request;
pub mod theme;
pub mod types;

pub use commands::{Cookie, Cursor, SurfaceCommand};
pub use partials::PartialNode;
pub use request::{ParamMap, ParamValue, RenderRequest, RenderResponse, RequestError};
pub use theme::{DefaultTheme, ParseThemeError, RuleKind, ThemeChoice, ThemeConfig, ThemeRule};
pub use types::{Point, Size};
