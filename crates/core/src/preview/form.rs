use partial_playground_protocol::{ParamMap, ParamValue};

/// Suffix marking a multi-value field in form data (`tags[]`).
pub const MULTI_VALUE_SUFFIX: &str = "[]";

/// Collect raw form entries (in document order) into parameter values.
///
/// Keys ending in [`MULTI_VALUE_SUFFIX`] accumulate into an ordered list under
/// the key without the suffix; any other key keeps only its last value.
pub fn collect_params<I, K, V>(entries: I) -> ParamMap
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut params = ParamMap::new();
    for (key, value) in entries {
        let key = key.as_ref();
        let value = value.into();
        match key.strip_suffix(MULTI_VALUE_SUFFIX) {
            Some(base) => match params.get_mut(base) {
                Some(ParamValue::List(items)) => items.push(value),
                _ => {
                    params.insert(base.to_string(), ParamValue::List(vec![value]));
                }
            },
            None => {
                params.insert(key.to_string(), ParamValue::Text(value));
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_keep_last_value() {
        let params = collect_params([("title", "a"), ("title", "b"), ("size", "lg")]);
        assert_eq!(params["title"], ParamValue::Text("b".into()));
        assert_eq!(params["size"], ParamValue::Text("lg".into()));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn multi_value_fields_collect_in_order() {
        let params = collect_params([
            ("colors[]", "red"),
            ("title", "x"),
            ("colors[]", "green"),
            ("colors[]", "blue"),
        ]);
        assert_eq!(
            params["colors"],
            ParamValue::List(vec!["red".into(), "green".into(), "blue".into()])
        );
        let keys: Vec<_> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, ["colors", "title"]);
    }

    #[test]
    fn empty_form_is_empty_map() {
        let params = collect_params(Vec::<(String, String)>::new());
        assert!(params.is_empty());
    }
}
