use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single form parameter as sent to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
    /// Multi-value field (`key[]` in the form), in form order.
    List(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

/// Field key → value, in the order the fields appear in the form.
pub type ParamMap = IndexMap<String, ParamValue>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("no partial selected")]
    EmptyPartial,
}

/// Everything the rendering collaborator needs to render one partial.
///
/// Field names follow the backend handler contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    #[serde(rename = "selectedPartial")]
    partial: String,
    #[serde(rename = "formData")]
    params: ParamMap,
}

impl RenderRequest {
    pub fn new(partial: impl Into<String>, params: ParamMap) -> Result<Self, RequestError> {
        let partial = partial.into();
        if partial.trim().is_empty() {
            return Err(RequestError::EmptyPartial);
        }
        Ok(Self { partial, params })
    }

    pub fn partial(&self) -> &str {
        &self.partial
    }

    pub fn params(&self) -> &ParamMap {
        &self.params
    }
}

/// Payload returned by the rendering collaborator on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResponse {
    #[serde(rename = "partialContentHtml", default)]
    pub html: Option<String>,
}

impl RenderResponse {
    pub fn with_html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
        }
    }

    /// The rendered markup, if there is anything to render.
    pub fn markup(&self) -> Option<&str> {
        self.html.as_deref().filter(|html| !html.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_partial() {
        assert_eq!(
            RenderRequest::new("  ", ParamMap::new()),
            Err(RequestError::EmptyPartial)
        );
    }

    #[test]
    fn serializes_with_handler_field_names() {
        let mut params = ParamMap::new();
        params.insert("title".into(), "Hello".into());
        params.insert("tags".into(), vec!["a".to_string(), "b".to_string()].into());
        params.insert("visible".into(), true.into());
        let request = RenderRequest::new("cards/hero", params).unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["selectedPartial"], "cards/hero");
        assert_eq!(json["formData"]["title"], "Hello");
        assert_eq!(json["formData"]["tags"][1], "b");
        assert_eq!(json["formData"]["visible"], true);
    }

    #[test]
    fn empty_or_missing_markup_is_none() {
        let missing: RenderResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.markup(), None);

        let null: RenderResponse = serde_json::from_str(r#"{"partialContentHtml":null}"#).unwrap();
        assert_eq!(null.markup(), None);

        assert_eq!(RenderResponse::with_html("").markup(), None);
        assert_eq!(RenderResponse::with_html("<p>x</p>").markup(), Some("<p>x</p>"));
    }

    #[test]
    fn untagged_values_deserialize() {
        let map: ParamMap =
            serde_json::from_str(r#"{"a":"x","b":2,"c":false,"d":["1","2"]}"#).unwrap();
        assert_eq!(map["a"], ParamValue::Text("x".into()));
        assert_eq!(map["b"], ParamValue::Number(2.0));
        assert_eq!(map["c"], ParamValue::Bool(false));
        assert_eq!(map["d"], ParamValue::List(vec!["1".into(), "2".into()]));
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);
    }
}
