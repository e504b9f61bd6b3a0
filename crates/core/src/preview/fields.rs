//! Which form edits reach the preview.
//!
//! Plain fields report edits through one native event each: text-like
//! inputs on every keystroke, choice fields when the choice changes. Backend
//! form widgets keep their value in a hidden locker element and announce
//! edits through their own events; see [`WidgetKind`].

/// Native event a plain field reports edits through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    Input,
    Change,
}

impl FieldEvent {
    /// `tag` is the element's tag name in any case; `input_type` its `type`
    /// attribute, if any.
    pub fn for_field(tag: &str, input_type: Option<&str>) -> Self {
        if tag.eq_ignore_ascii_case("select") {
            return FieldEvent::Change;
        }
        let choice = input_type.is_some_and(|kind| {
            kind.eq_ignore_ascii_case("checkbox") || kind.eq_ignore_ascii_case("radio")
        });
        if tag.eq_ignore_ascii_case("input") && choice {
            FieldEvent::Change
        } else {
            FieldEvent::Input
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldEvent::Input => "input",
            FieldEvent::Change => "change",
        }
    }

    /// Whether an event of type `event_type` on the field is an edit.
    pub fn reports(tag: &str, input_type: Option<&str>, event_type: &str) -> bool {
        Self::for_field(tag, input_type).as_str() == event_type
    }
}

/// Backend form widgets whose edits never surface as native field events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Datepicker,
    Colorpicker,
    Codeeditor,
    Richeditor,
    Mediafinder,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 5] = [
        WidgetKind::Datepicker,
        WidgetKind::Colorpicker,
        WidgetKind::Codeeditor,
        WidgetKind::Richeditor,
        WidgetKind::Mediafinder,
    ];

    /// Value of the container's `data-control` attribute.
    pub fn control(self) -> &'static str {
        match self {
            WidgetKind::Datepicker => "datepicker",
            WidgetKind::Colorpicker => "colorpicker",
            WidgetKind::Codeeditor => "codeeditor",
            WidgetKind::Richeditor => "richeditor",
            WidgetKind::Mediafinder => "mediafinder",
        }
    }

    pub fn container_selector(self) -> String {
        format!(r#"[data-control="{}"]"#, self.control())
    }

    /// jQuery event announcing an edit, for widgets that emit one on their
    /// container.
    pub fn container_event(self) -> Option<&'static str> {
        match self {
            WidgetKind::Datepicker => Some("change.oc.datepicker"),
            WidgetKind::Colorpicker => Some("change.oc.colorpicker"),
            WidgetKind::Codeeditor => Some("oc.codeEditorReady"),
            WidgetKind::Richeditor | WidgetKind::Mediafinder => None,
        }
    }

    /// Whether edits are only reported when the locker value differs from
    /// the last one seen.
    pub fn gated(self) -> bool {
        matches!(self, WidgetKind::Datepicker | WidgetKind::Colorpicker)
    }
}

/// Remembers a widget's last seen value so re-announced values are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueGate {
    last: String,
}

impl ValueGate {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            last: initial.into(),
        }
    }

    /// Whether `current` differs from the previous value; records it.
    pub fn changed(&mut self, current: &str) -> bool {
        if self.last == current {
            return false;
        }
        current.clone_into(&mut self.last);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_use_input_and_choices_use_change() {
        assert_eq!(FieldEvent::for_field("INPUT", Some("text")), FieldEvent::Input);
        assert_eq!(FieldEvent::for_field("INPUT", None), FieldEvent::Input);
        assert_eq!(FieldEvent::for_field("INPUT", Some("number")), FieldEvent::Input);
        assert_eq!(FieldEvent::for_field("TEXTAREA", None), FieldEvent::Input);
        assert_eq!(FieldEvent::for_field("SELECT", None), FieldEvent::Change);
        assert_eq!(FieldEvent::for_field("input", Some("checkbox")), FieldEvent::Change);
        assert_eq!(FieldEvent::for_field("INPUT", Some("Radio")), FieldEvent::Change);
    }

    #[test]
    fn blur_change_on_text_field_is_not_an_edit() {
        assert!(FieldEvent::reports("INPUT", Some("text"), "input"));
        assert!(!FieldEvent::reports("INPUT", Some("text"), "change"));
        assert!(!FieldEvent::reports("TEXTAREA", None, "change"));
        assert!(FieldEvent::reports("SELECT", None, "change"));
        assert!(!FieldEvent::reports("INPUT", Some("checkbox"), "input"));
    }

    #[test]
    fn widgets_cover_every_control() {
        let controls: Vec<_> = WidgetKind::ALL.iter().map(|kind| kind.control()).collect();
        assert_eq!(
            controls,
            ["datepicker", "colorpicker", "codeeditor", "richeditor", "mediafinder"]
        );
        assert_eq!(
            WidgetKind::Datepicker.container_selector(),
            r#"[data-control="datepicker"]"#
        );
        assert_eq!(
            WidgetKind::Colorpicker.container_event(),
            Some("change.oc.colorpicker")
        );
        assert_eq!(WidgetKind::Richeditor.container_event(), None);
        assert!(WidgetKind::Datepicker.gated());
        assert!(!WidgetKind::Mediafinder.gated());
    }

    #[test]
    fn gate_ignores_repeated_values() {
        let mut gate = ValueGate::new("2024-01-01");
        assert!(!gate.changed("2024-01-01"));
        assert!(gate.changed("2024-02-01"));
        assert!(!gate.changed("2024-02-01"));
        assert!(gate.changed(""));
    }
}
