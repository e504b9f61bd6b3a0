use partial_playground_protocol::PartialNode;

/// One entry of the flattened partial selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialOption {
    pub key: String,
    pub label: String,
    /// Nesting level; folders at the root are depth 0.
    pub depth: usize,
    /// Folders are headers only.
    pub selectable: bool,
}

impl PartialOption {
    /// Label prefixed with one guide per nesting level.
    pub fn indented_label(&self) -> String {
        format!("{}{}", "|\u{a0}\u{a0}".repeat(self.depth), self.label)
    }

    /// Tooltip: the template file for selectable entries, the folder path
    /// otherwise.
    pub fn title(&self) -> String {
        if self.selectable {
            format!("{}.htm", self.key)
        } else {
            self.key.clone()
        }
    }
}

/// Depth-first flattening of the partial tree; each folder is followed by
/// its children one level deeper.
pub fn flatten_partials(tree: &[PartialNode]) -> Vec<PartialOption> {
    let mut options = Vec::new();
    flatten_into(tree, 0, &mut options);
    options
}

fn flatten_into(nodes: &[PartialNode], depth: usize, out: &mut Vec<PartialOption>) {
    for node in nodes {
        match node {
            PartialNode::File { key, name } => out.push(PartialOption {
                key: key.clone(),
                label: label_for(key, name),
                depth,
                selectable: true,
            }),
            PartialNode::Folder {
                key,
                name,
                children,
            } => {
                out.push(PartialOption {
                    key: key.clone(),
                    label: label_for(key, name),
                    depth,
                    selectable: false,
                });
                flatten_into(children, depth + 1, out);
            }
        }
    }
}

/// The listing's name, or one derived from the last key segment when the
/// listing leaves it blank.
fn label_for(key: &str, name: &str) -> String {
    if name.trim().is_empty() {
        prettify_name(key.rsplit('/').next().unwrap_or(key))
    } else {
        name.to_string()
    }
}

/// First file in depth-first order, used as the initial selection.
pub fn first_selectable(tree: &[PartialNode]) -> Option<&str> {
    tree.iter().find_map(|node| match node {
        PartialNode::File { key, .. } => Some(key.as_str()),
        PartialNode::Folder { children, .. } => first_selectable(children),
    })
}

/// Human readable label for a file or folder name:
/// `callTo-action_banner` becomes `Call To Action Banner`.
pub fn prettify_name(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len() + 8);
    let mut prev_lower = false;
    for ch in raw.chars() {
        let ch = if matches!(ch, '-' | '_' | '.') { ' ' } else { ch };
        if ch.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = ch.is_lowercase();
        spaced.push(ch);
    }

    let mut pretty = String::with_capacity(spaced.len());
    let mut word_start = true;
    for ch in spaced.to_lowercase().chars() {
        if word_start {
            pretty.extend(ch.to_uppercase());
        } else {
            pretty.push(ch);
        }
        word_start = ch.is_whitespace();
    }
    pretty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(key: &str, name: &str) -> PartialNode {
        PartialNode::File {
            key: key.into(),
            name: name.into(),
        }
    }

    fn folder(key: &str, name: &str, children: Vec<PartialNode>) -> PartialNode {
        PartialNode::Folder {
            key: key.into(),
            name: name.into(),
            children,
        }
    }

    fn sample_tree() -> Vec<PartialNode> {
        vec![
            folder(
                "cards",
                "Cards",
                vec![
                    folder("cards/pricing", "Pricing", vec![file("cards/pricing/table", "Table")]),
                    file("cards/hero", "Hero"),
                ],
            ),
            file("footer", "Footer"),
        ]
    }

    #[test]
    fn flattens_with_depth_and_headers() {
        let options = flatten_partials(&sample_tree());
        let summary: Vec<_> = options
            .iter()
            .map(|o| (o.key.as_str(), o.depth, o.selectable))
            .collect();
        assert_eq!(
            summary,
            [
                ("cards", 0, false),
                ("cards/pricing", 1, false),
                ("cards/pricing/table", 2, true),
                ("cards/hero", 1, true),
                ("footer", 0, true),
            ]
        );
        assert_eq!(options[2].indented_label(), "|\u{a0}\u{a0}|\u{a0}\u{a0}Table");
        assert_eq!(options[2].title(), "cards/pricing/table.htm");
        assert_eq!(options[0].title(), "cards");
    }

    #[test]
    fn blank_names_are_derived_from_the_key() {
        let options = flatten_partials(&[file("cards/callTo-action_banner", " ")]);
        assert_eq!(options[0].label, "Call To Action Banner");
    }

    #[test]
    fn first_selectable_descends_into_folders() {
        assert_eq!(first_selectable(&sample_tree()), Some("cards/pricing/table"));
        assert_eq!(first_selectable(&[folder("empty", "Empty", vec![])]), None);
        assert_eq!(first_selectable(&[]), None);
    }

    #[test]
    fn prettifies_names() {
        assert_eq!(prettify_name("callTo-action_banner"), "Call To Action Banner");
        assert_eq!(prettify_name("hero"), "Hero");
        assert_eq!(prettify_name("card.v2"), "Card V2");
        assert_eq!(prettify_name("FAQ_list"), "Faq List");
    }
}
