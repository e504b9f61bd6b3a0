use partial_playground_protocol::{ParamMap, ParamValue};

/// Template include tag reproducing the current preview:
///
/// ```text
/// {% partial 'folder/card'
///     title = 'Hello'
///     tags = ['a', 'b']
/// %}
/// ```
///
/// Parameters are tab-indented in form order.
pub fn partial_tag(folder: Option<&str>, partial: &str, params: &ParamMap) -> String {
    let path = match folder.map(|f| f.trim_end_matches('/')) {
        Some(folder) if !folder.is_empty() => format!("{folder}/{partial}"),
        _ => partial.to_string(),
    };
    let lines: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key} = {}", format_value(value)))
        .collect();
    format!("{{% partial '{path}'\n\t{}\n%}}", lines.join("\n\t"))
}

fn format_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Bool(flag) => flag.to_string(),
        ParamValue::Number(number) => number.to_string(),
        ParamValue::Text(text) => quote(text),
        ParamValue::List(items) => {
            let quoted: Vec<String> = items.iter().map(|item| quote(item)).collect();
            format!("[{}]", quoted.join(", "))
        }
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_every_value_kind() {
        let mut params = ParamMap::new();
        params.insert("title".into(), "It's here".into());
        params.insert("tags".into(), vec!["a".to_string(), "b".to_string()].into());
        params.insert("wide".into(), true.into());
        params.insert("columns".into(), 3.0.into());
        params.insert("ratio".into(), 1.5.into());

        assert_eq!(
            partial_tag(Some("blocks"), "cards/hero", &params),
            "{% partial 'blocks/cards/hero'\n\
             \ttitle = 'It\\'s here'\n\
             \ttags = ['a', 'b']\n\
             \twide = true\n\
             \tcolumns = 3\n\
             \tratio = 1.5\n\
             %}"
        );
    }

    #[test]
    fn lists_quote_each_item() {
        let mut params = ParamMap::new();
        params.insert("empty".into(), Vec::<String>::new().into());
        params.insert("one".into(), vec!["o'clock".to_string()].into());
        assert_eq!(
            partial_tag(None, "clock", &params),
            "{% partial 'clock'\n\tempty = []\n\tone = ['o\\'clock']\n%}"
        );
    }

    #[test]
    fn omits_missing_folder() {
        let tag = partial_tag(None, "footer", &ParamMap::new());
        assert_eq!(tag, "{% partial 'footer'\n\t\n%}");
        assert_eq!(partial_tag(Some(""), "footer", &ParamMap::new()), tag);
        assert!(partial_tag(Some("ui/"), "footer", &ParamMap::new()).starts_with("{% partial 'ui/footer'"));
    }
}
