use partial_playground_protocol::{
    Cookie, DefaultTheme, RuleKind, SurfaceCommand, ThemeChoice, ThemeConfig, ThemeRule,
};

/// Cookie remembering the user's explicit theme choice.
pub const THEME_COOKIE: &str = "iframe_color_mode_user";
pub const THEME_COOKIE_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;

/// Toggles exactly one of the two configured themes on the target element.
#[derive(Debug, Clone)]
pub struct ThemeApplier {
    config: ThemeConfig,
}

impl ThemeApplier {
    pub fn new(config: ThemeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ThemeConfig {
        &self.config
    }

    /// Commands that switch the target to `choice`.
    ///
    /// The other theme's marker is removed before the new one is added, so
    /// the two never coexist. `persist` is set for explicit user toggles
    /// only; it adds the cookie write.
    pub fn apply(&self, choice: ThemeChoice, persist: bool) -> Vec<SurfaceCommand> {
        let target = &self.config.target;
        let mut commands = Vec::with_capacity(4);
        commands.extend(remove_rule(target, self.config.rule(choice.other())));
        commands.extend(add_rule(target, self.config.rule(choice)));
        commands.push(SurfaceCommand::SetColorMode { mode: choice });
        if persist {
            commands.push(SurfaceCommand::WriteCookie {
                cookie: theme_cookie(choice),
            });
        }
        commands
    }
}

fn remove_rule(target: &str, rule: &ThemeRule) -> Option<SurfaceCommand> {
    match rule.kind {
        RuleKind::Class => rule
            .value
            .as_ref()
            .filter(|class| !class.is_empty())
            .map(|class| SurfaceCommand::RemoveClass {
                selector: target.to_string(),
                class: class.clone(),
            }),
        RuleKind::Attribute => rule.name.as_ref().map(|name| SurfaceCommand::RemoveAttribute {
            selector: target.to_string(),
            name: name.clone(),
        }),
    }
}

fn add_rule(target: &str, rule: &ThemeRule) -> Option<SurfaceCommand> {
    match rule.kind {
        RuleKind::Class => rule
            .value
            .as_ref()
            .filter(|class| !class.is_empty())
            .map(|class| SurfaceCommand::AddClass {
                selector: target.to_string(),
                class: class.clone(),
            }),
        RuleKind::Attribute => rule.name.as_ref().map(|name| SurfaceCommand::SetAttribute {
            selector: target.to_string(),
            name: name.clone(),
            value: rule.value.clone().unwrap_or_default(),
        }),
    }
}

pub fn theme_cookie(choice: ThemeChoice) -> Cookie {
    Cookie {
        name: THEME_COOKIE.to_string(),
        value: choice.as_str().to_string(),
        max_age_secs: THEME_COOKIE_MAX_AGE_SECS,
        path: "/".to_string(),
    }
}

/// Value of cookie `name` in a `document.cookie` style header.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

/// Initial theme: the user's remembered choice, else the configured default,
/// else (for `auto`) the host's effective color mode.
pub fn resolve_initial_theme(
    cookie_header: Option<&str>,
    default: DefaultTheme,
    host_mode: ThemeChoice,
) -> ThemeChoice {
    let remembered = cookie_header
        .and_then(|header| cookie_value(header, THEME_COOKIE))
        .and_then(|value| value.parse().ok());
    if let Some(choice) = remembered {
        return choice;
    }
    match default {
        DefaultTheme::Light => ThemeChoice::Light,
        DefaultTheme::Dark => ThemeChoice::Dark,
        DefaultTheme::Auto => host_mode,
    }
}
