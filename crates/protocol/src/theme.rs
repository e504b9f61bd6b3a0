use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the two mutually exclusive preview themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    Light,
    Dark,
}

impl ThemeChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeChoice::Light => "light",
            ThemeChoice::Dark => "dark",
        }
    }

    /// The theme that has to be removed before this one is applied.
    pub fn other(self) -> Self {
        match self {
            ThemeChoice::Light => ThemeChoice::Dark,
            ThemeChoice::Dark => ThemeChoice::Light,
        }
    }
}

impl fmt::Display for ThemeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme `{0}`, expected `light` or `dark`")]
pub struct ParseThemeError(pub String);

impl FromStr for ThemeChoice {
    type Err = ParseThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(ThemeChoice::Light),
            "dark" => Ok(ThemeChoice::Dark),
            other => Err(ParseThemeError(other.to_string())),
        }
    }
}

/// Configured default theme. `Auto` defers to the host system's effective
/// color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultTheme {
    Light,
    Dark,
    #[default]
    Auto,
}

/// How a theme rule marks the target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Class,
    Attribute,
}

/// A single theme marker: either a CSS class or an attribute.
///
/// `name` is the attribute name and is only meaningful for
/// [`RuleKind::Attribute`], where it is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRule {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl ThemeRule {
    pub fn class(value: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Class,
            name: None,
            value: Some(value.into()),
        }
    }

    pub fn attribute(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            kind: RuleKind::Attribute,
            name: Some(name.into()),
            value,
        }
    }
}

/// Declarative light/dark rule set applied to `target` inside the preview
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// CSS selector of the element carrying the theme marker.
    pub target: String,
    pub light: ThemeRule,
    pub dark: ThemeRule,
}

impl ThemeConfig {
    pub fn rule(&self, choice: ThemeChoice) -> &ThemeRule {
        match choice {
            ThemeChoice::Light => &self.light,
            ThemeChoice::Dark => &self.dark,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            target: "html".to_string(),
            light: ThemeRule::class("light"),
            dark: ThemeRule::class("dark"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_choice() {
        assert_eq!("dark".parse::<ThemeChoice>(), Ok(ThemeChoice::Dark));
        assert_eq!(" light ".parse::<ThemeChoice>(), Ok(ThemeChoice::Light));
        assert!("auto".parse::<ThemeChoice>().is_err());
    }

    #[test]
    fn deserializes_attribute_rule() {
        let json = r#"{
            "target": "body",
            "light": { "type": "attribute", "name": "data-bs-theme", "value": "light" },
            "dark": { "type": "attribute", "name": "data-bs-theme", "value": null }
        }"#;
        let config: ThemeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.target, "body");
        assert_eq!(config.rule(ThemeChoice::Light).kind, RuleKind::Attribute);
        assert_eq!(config.rule(ThemeChoice::Dark).value, None);
    }

    #[test]
    fn other_is_involution() {
        for choice in [ThemeChoice::Light, ThemeChoice::Dark] {
            assert_ne!(choice.other(), choice);
            assert_eq!(choice.other().other(), choice);
        }
    }
}
