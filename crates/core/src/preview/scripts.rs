//! Script revival after the preview content is replaced.
//!
//! Markup injected through `innerHTML` does not execute its `<script>`
//! elements, and page-lifecycle hooks have already fired. Revival replaces
//! every relevant script with a fresh element whose code runs inside its own
//! function scope, then replays the lifecycle events.
//!
//! Planning is pure: the adapter takes a [`DocumentSnapshot`], asks for a
//! [`RevivePlan`] and performs the DOM work. Inline scripts are replaced in
//! plan order. External scripts are fetched independently, so their execution
//! order relative to each other and to inline scripts is not guaranteed.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Attribute marking scripts supplied by the theme rather than the preview
/// chrome. Revived scripts carry it too.
pub const USER_SCRIPT_ATTR: &str = "data-user-script";

/// Position of a script element in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNode {
    pub id: ScriptId,
    /// Resolved `src`; `None` or empty for inline scripts.
    pub src: Option<String>,
    pub text: String,
    /// Inside the preview's content region.
    pub in_content_region: bool,
    /// Carries [`USER_SCRIPT_ATTR`].
    pub user_supplied: bool,
}

impl ScriptNode {
    pub fn external_src(&self) -> Option<&str> {
        self.src.as_deref().filter(|src| !src.is_empty())
    }
}

/// Every script element of the surface document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub scripts: Vec<ScriptNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviveStep {
    /// Replace the script synchronously with a wrapped copy of `code`.
    Inline { script: ScriptId, code: String },
    /// Fetch `src`, pass the text through [`prepare_external`], then replace
    /// the script. A failed fetch only affects this script.
    External { script: ScriptId, src: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Document,
    Window,
}

/// Page-lifecycle events replayed after revival. Both bubble and are
/// cancelable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    DomContentLoaded,
    Load,
}

impl LifecycleEvent {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleEvent::DomContentLoaded => "DOMContentLoaded",
            LifecycleEvent::Load => "load",
        }
    }

    pub fn target(self) -> EventTarget {
        match self {
            LifecycleEvent::DomContentLoaded => EventTarget::Document,
            LifecycleEvent::Load => EventTarget::Window,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevivePlan {
    pub steps: Vec<ReviveStep>,
    /// Dispatched once all steps are scheduled.
    pub events: Vec<LifecycleEvent>,
}

/// Select the scripts to revive: those in the content region, then the
/// user-supplied ones elsewhere, each at most once.
pub fn plan_revival(snapshot: &DocumentSnapshot) -> RevivePlan {
    let in_region = snapshot.scripts.iter().filter(|s| s.in_content_region);
    let user = snapshot.scripts.iter().filter(|s| s.user_supplied);

    let mut seen = HashSet::new();
    let steps = in_region
        .chain(user)
        .filter(|script| seen.insert(script.id))
        .map(|script| match script.external_src() {
            Some(src) => ReviveStep::External {
                script: script.id,
                src: src.to_string(),
            },
            None => ReviveStep::Inline {
                script: script.id,
                code: wrap_isolated(&script.text),
            },
        })
        .collect();

    RevivePlan {
        steps,
        events: vec![LifecycleEvent::DomContentLoaded, LifecycleEvent::Load],
    }
}

#[allow(clippy::expect_used)]
fn source_map_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)//[#@]\s*sourceMappingURL=.*$").expect("source map regex must compile")
    })
}

/// Remove `//# sourceMappingURL=` (and legacy `//@`) directives. The relative
/// map URL would resolve against the wrong base once the code is inlined.
pub fn strip_source_map_directives(code: &str) -> String {
    source_map_directive().replace_all(code, "").into_owned()
}

/// Wrap `code` in an immediately invoked function so top-level declarations
/// of different scripts cannot collide. The code sits on its own lines so a
/// trailing line comment cannot swallow the closing of the wrapper.
pub fn wrap_isolated(code: &str) -> String {
    format!("(function(){{\n{code}\n}})();")
}

/// Text of a fetched external script, ready to inline.
pub fn prepare_external(code: &str) -> String {
    wrap_isolated(&strip_source_map_directives(code))
}

/// Page operations a [`RevivePlan`] is carried out with.
pub trait ScriptRunner {
    type Error: fmt::Display;

    /// Replace `script` with a fresh element running `code`.
    fn run_inline(&mut self, script: ScriptId, code: &str) -> Result<(), Self::Error>;
    /// Start fetching `src`; the script is replaced when the fetch completes.
    fn load_external(&mut self, script: ScriptId, src: &str);
    fn dispatch(&mut self, event: LifecycleEvent) -> Result<(), Self::Error>;
}

/// Carry out `plan`. A failing step is skipped and the rest still run; the
/// lifecycle events are dispatched in every case. Returns the failures.
pub fn execute_revival<R: ScriptRunner>(plan: RevivePlan, runner: &mut R) -> Vec<R::Error> {
    let mut failures = Vec::new();
    for step in plan.steps {
        match step {
            ReviveStep::Inline { script, code } => {
                if let Err(err) = runner.run_inline(script, &code) {
                    tracing::warn!(script = script.0, error = %err, "inline script revival failed");
                    failures.push(err);
                }
            }
            ReviveStep::External { script, src } => runner.load_external(script, &src),
        }
    }
    for event in plan.events {
        if let Err(err) = runner.dispatch(event) {
            tracing::warn!(event = event.name(), error = %err, "lifecycle event dispatch failed");
            failures.push(err);
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(id: usize, src: Option<&str>, text: &str, region: bool, user: bool) -> ScriptNode {
        ScriptNode {
            id: ScriptId(id),
            src: src.map(str::to_string),
            text: text.to_string(),
            in_content_region: region,
            user_supplied: user,
        }
    }

    #[test]
    fn selects_region_and_user_scripts_once() {
        let snapshot = DocumentSnapshot {
            scripts: vec![
                script(0, Some("/chrome.js"), "", false, false),
                script(1, Some("/theme.js"), "", false, true),
                script(2, None, "let a = 1;", true, false),
                script(3, None, "let b = 2;", true, true),
            ],
        };
        let plan = plan_revival(&snapshot);
        let ids: Vec<_> = plan
            .steps
            .iter()
            .map(|step| match step {
                ReviveStep::Inline { script, .. } | ReviveStep::External { script, .. } => {
                    script.0
                }
            })
            .collect();
        assert_eq!(ids, [2, 3, 1]);
        assert_eq!(
            plan.events,
            [LifecycleEvent::DomContentLoaded, LifecycleEvent::Load]
        );
    }

    #[test]
    fn empty_src_is_inline() {
        let snapshot = DocumentSnapshot {
            scripts: vec![script(0, Some(""), "go()", true, false)],
        };
        let plan = plan_revival(&snapshot);
        assert_eq!(
            plan.steps,
            [ReviveStep::Inline {
                script: ScriptId(0),
                code: "(function(){\ngo()\n})();".into()
            }]
        );
    }

    #[test]
    fn lifecycle_events_fire_even_without_scripts() {
        let plan = plan_revival(&DocumentSnapshot::default());
        assert!(plan.steps.is_empty());
        assert_eq!(plan.events.len(), 2);
        assert_eq!(plan.events[0].target(), EventTarget::Document);
        assert_eq!(plan.events[1].name(), "load");
    }

    #[test]
    fn strips_source_map_directives() {
        let code = "var x = 1;\n//# sourceMappingURL=app.js.map\nvar y = 2; //@ sourceMappingURL=old.map\n";
        assert_eq!(
            strip_source_map_directives(code),
            "var x = 1;\n\nvar y = 2; \n"
        );
    }

    #[test]
    fn same_named_declarations_get_separate_scopes() {
        let first = wrap_isolated("const counter = 1;");
        let second = prepare_external("const counter = 2;\n//# sourceMappingURL=b.map");
        for wrapped in [&first, &second] {
            assert!(wrapped.starts_with("(function(){\n"));
            assert!(wrapped.ends_with("\n})();"));
        }
        assert!(!second.contains("sourceMappingURL"));
        // Concatenated, the two declarations live in sibling function bodies.
        let combined = format!("{first}\n{second}");
        assert_eq!(combined.matches("(function(){").count(), 2);
    }

    #[test]
    fn trailing_line_comment_does_not_break_wrapper() {
        let wrapped = wrap_isolated("init(); // done");
        assert_eq!(wrapped.lines().last(), Some("})();"));
    }

    #[derive(Default)]
    struct RecordingRunner {
        broken: HashSet<usize>,
        inline: Vec<usize>,
        external: Vec<String>,
        dispatched: Vec<&'static str>,
    }

    impl ScriptRunner for RecordingRunner {
        type Error = String;

        fn run_inline(&mut self, script: ScriptId, _code: &str) -> Result<(), String> {
            if self.broken.contains(&script.0) {
                return Err(format!("script {} rejected", script.0));
            }
            self.inline.push(script.0);
            Ok(())
        }

        fn load_external(&mut self, _script: ScriptId, src: &str) {
            self.external.push(src.to_string());
        }

        fn dispatch(&mut self, event: LifecycleEvent) -> Result<(), String> {
            self.dispatched.push(event.name());
            Ok(())
        }
    }

    #[test]
    fn failing_inline_script_does_not_stop_revival() {
        let snapshot = DocumentSnapshot {
            scripts: vec![
                script(0, None, "broken(", true, false),
                script(1, Some("/widget.js"), "", true, false),
                script(2, None, "ok()", true, false),
            ],
        };
        let mut runner = RecordingRunner {
            broken: HashSet::from([0]),
            ..RecordingRunner::default()
        };
        let failures = execute_revival(plan_revival(&snapshot), &mut runner);

        assert_eq!(failures, ["script 0 rejected"]);
        assert_eq!(runner.inline, [2]);
        assert_eq!(runner.external, ["/widget.js"]);
        assert_eq!(runner.dispatched, ["DOMContentLoaded", "load"]);
    }
}
