use std::time::Duration;

use partial_playground_protocol::{DefaultTheme, RuleKind, ThemeChoice, ThemeConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("zoom bounds must satisfy 0 < min_scale <= max_scale (got {min}..{max})")]
    ScaleBounds { min: f64, max: f64 },
    #[error("zoom step must be a positive number of percentage points")]
    ZoomStep,
    #[error("debounce delay must be greater than zero")]
    Debounce,
    #[error("{theme} theme rule of type `attribute` needs a non-empty `name`")]
    AttributeName { theme: ThemeChoice },
}

/// Zoom and fit parameters of the viewport controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Step in percentage points; also the spacing of the zoom grid.
    pub step_percent: u32,
    /// Horizontal space kept free around fitted content, in pixels.
    pub margin_x: f64,
    /// Vertical space kept free around fitted content (toolbar included).
    pub margin_y: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 2.0,
            step_percent: 10,
            margin_x: 40.0,
            margin_y: 80.0,
        }
    }
}

/// Settings injected by the host page as JSON. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    pub debounce_ms: u64,
    pub zoom: ZoomConfig,
    pub theme: ThemeConfig,
    pub default_theme: DefaultTheme,
    /// Folder under the theme's `partials/` directory the listing starts at.
    pub partials_folder: Option<String>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            zoom: ZoomConfig::default(),
            theme: ThemeConfig::default(),
            default_theme: DefaultTheme::Auto,
            partials_folder: None,
        }
    }
}

impl PlaygroundConfig {
    /// Parse and validate a config document. An empty string yields the
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = if json.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(json)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ZoomConfig {
            min_scale,
            max_scale,
            step_percent,
            ..
        } = self.zoom;
        if !(min_scale > 0.0 && min_scale <= max_scale && max_scale.is_finite()) {
            return Err(ConfigError::ScaleBounds {
                min: min_scale,
                max: max_scale,
            });
        }
        if step_percent == 0 {
            return Err(ConfigError::ZoomStep);
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::Debounce);
        }
        for theme in [ThemeChoice::Light, ThemeChoice::Dark] {
            let rule = self.theme.rule(theme);
            let named = rule.name.as_deref().is_some_and(|name| !name.trim().is_empty());
            if rule.kind == RuleKind::Attribute && !named {
                return Err(ConfigError::AttributeName { theme });
            }
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
