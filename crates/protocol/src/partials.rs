use serde::{Deserialize, Serialize};

/// A node of the partial listing supplied by the backend.
///
/// `key` is the path-like identifier relative to the partials folder
/// (`cards/hero`), `name` the human readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PartialNode {
    File {
        key: String,
        name: String,
    },
    Folder {
        key: String,
        name: String,
        #[serde(default)]
        children: Vec<PartialNode>,
    },
}

impl PartialNode {
    pub fn key(&self) -> &str {
        match self {
            PartialNode::File { key, .. } | PartialNode::Folder { key, .. } => key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PartialNode::File { name, .. } | PartialNode::Folder { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_tree() {
        let json = r#"[
            {"type":"file","key":"hero","name":"Hero"},
            {"type":"folder","key":"cards","name":"Cards","children":[
                {"type":"file","key":"cards/price","name":"Price"}
            ]}
        ]"#;
        let tree: Vec<PartialNode> = serde_json::from_str(json).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].key(), "cards");
        match &tree[1] {
            PartialNode::Folder { children, .. } => assert_eq!(children[0].name(), "Price"),
            PartialNode::File { .. } => panic!("expected folder"),
        }
    }
}
