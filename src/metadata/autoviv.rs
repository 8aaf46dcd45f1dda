//! Recursive auto-vivifying map.
//!
//! Missing keys resolve to a new empty map that is inserted on first access,
//! so arbitrarily deep paths can be written without declaring a schema:
//!
//! ```
//! use assembly_metadata::metadata::AutoVivifyingMap;
//!
//! let mut tree = AutoVivifyingMap::new();
//! tree.path(&["kmc", "k31"]).unwrap().set("unique_kmers", 1200);
//! assert_eq!(
//!     tree.to_json(),
//!     serde_json::json!({"kmc": {"k31": {"unique_kmers": 1200}}})
//! );
//! ```

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::error::MetadataError;

/// A node in an [`AutoVivifyingMap`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Branch(AutoVivifyingMap),
    Leaf(Value),
}

impl Node {
    fn to_json(&self) -> Value {
        match self {
            Node::Branch(map) => map.to_json(),
            Node::Leaf(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoVivifyingMap {
    children: IndexMap<String, Node>,
}

impl AutoVivifyingMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        AutoVivifyingMap {
            children: IndexMap::new(),
        }
    }

    /// Returns the nested map stored under `key`, inserting an empty one if
    /// the key is missing.
    ///
    /// Fails if `key` already holds a leaf value.
    pub fn entry(&mut self, key: &str) -> Result<&mut AutoVivifyingMap, MetadataError> {
        let node = self
            .children
            .entry(key.to_string())
            .or_insert_with(|| Node::Branch(AutoVivifyingMap::new()));
        match node {
            Node::Branch(map) => Ok(map),
            Node::Leaf(_) => Err(MetadataError::NotABranch(key.to_string())),
        }
    }

    /// Walks `keys`, vivifying every missing level, and returns the innermost map.
    pub fn path(&mut self, keys: &[&str]) -> Result<&mut AutoVivifyingMap, MetadataError> {
        let mut current = self;
        for key in keys {
            current = current.entry(key)?;
        }
        Ok(current)
    }

    /// Stores a leaf value, replacing whatever was under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.children.insert(key.into(), Node::Leaf(value.into()));
    }

    /// Reads a node without vivifying it.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    /// Removes a node, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.children.shift_remove(key)
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the map has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.children.keys()
    }

    /// Converts the tree into a plain JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Converts the tree into a JSON map.
    pub fn to_map(&self) -> Map<String, Value> {
        self.children
            .iter()
            .map(|(key, node)| (key.clone(), node.to_json()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_vivifies_missing_keys() {
        let mut tree = AutoVivifyingMap::new();
        assert!(tree.is_empty());
        tree.entry("a").unwrap().entry("b").unwrap();
        assert_eq!(tree.to_json(), json!({"a": {"b": {}}}));
    }

    #[test]
    fn test_entry_is_stable() {
        let mut tree = AutoVivifyingMap::new();
        tree.entry("sample").unwrap().set("reads", 10);
        tree.entry("sample").unwrap().set("bases", 1500);
        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.to_json(),
            json!({"sample": {"reads": 10, "bases": 1500}})
        );
    }

    #[test]
    fn test_path_and_leaves() {
        let mut tree = AutoVivifyingMap::new();
        tree.path(&["x", "y", "z"]).unwrap().set("depth", 3);
        match tree.get("x") {
            Some(Node::Branch(inner)) => assert_eq!(inner.len(), 1),
            other => panic!("unexpected node {:?}", other),
        }
        assert_eq!(tree.to_json(), json!({"x": {"y": {"z": {"depth": 3}}}}));
    }

    #[test]
    fn test_entry_on_leaf_fails() {
        let mut tree = AutoVivifyingMap::new();
        tree.set("leaf", "value");
        assert_eq!(
            tree.entry("leaf").unwrap_err(),
            MetadataError::NotABranch("leaf".to_string())
        );
        assert!(tree.path(&["leaf", "deeper"]).is_err());
    }

    #[test]
    fn test_remove() {
        let mut tree = AutoVivifyingMap::new();
        tree.set("a", 1);
        tree.entry("b").unwrap();
        assert_eq!(tree.remove("a"), Some(Node::Leaf(json!(1))));
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["b"]);
    }
}
