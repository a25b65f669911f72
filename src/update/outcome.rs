use std::collections::BTreeMap;

use serde::Serialize;

/// Property tree mirroring a retrieved file or directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyNode {
    /// Versioned properties of a file, by property name.
    File(BTreeMap<String, String>),
    /// Child nodes of a directory, by entry name.
    Directory(BTreeMap<String, PropertyNode>),
}

/// Result of an update: a plain flag, or the property tree when properties
/// were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UpdateOutcome {
    Done(bool),
    Properties(PropertyNode),
}

impl UpdateOutcome {
    /// True unless the outcome is `Done(false)`.
    pub fn is_success(&self) -> bool {
        !matches!(self, UpdateOutcome::Done(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_serializes_as_bool() {
        assert_eq!(serde_json::to_string(&UpdateOutcome::Done(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&UpdateOutcome::Done(false)).unwrap(), "false");
    }

    #[test]
    fn properties_serialize_as_nested_objects() {
        let mut file = BTreeMap::new();
        file.insert("svn:eol-style".to_string(), "native".to_string());
        let mut dir = BTreeMap::new();
        dir.insert("readme.txt".to_string(), PropertyNode::File(file));
        dir.insert("empty".to_string(), PropertyNode::Directory(BTreeMap::new()));

        let outcome = UpdateOutcome::Properties(PropertyNode::Directory(dir));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({
                "empty": {},
                "readme.txt": { "svn:eol-style": "native" }
            })
        );
    }

    #[test]
    fn is_success() {
        assert!(UpdateOutcome::Done(true).is_success());
        assert!(!UpdateOutcome::Done(false).is_success());
        assert!(UpdateOutcome::Properties(PropertyNode::File(BTreeMap::new())).is_success());
    }
}
