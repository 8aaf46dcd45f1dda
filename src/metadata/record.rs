//! Per-sample metadata record grouped by category.

use indexmap::IndexMap;
use log::warn;
use serde_json::{Map, Value};

use super::autoviv::AutoVivifyingMap;
use super::error::MetadataError;
use super::store::AttributeStore;

/// Categories starting with this prefix are internal; their contents are never serialized.
pub const RESERVED_PREFIX: &str = "__";

/// What a category of a [`HierarchicalRecord`] holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Category {
    Store(AttributeStore),
    Record(HierarchicalRecord),
    Tree(AutoVivifyingMap),
    Scalar(Value),
}

impl Category {
    fn kind(&self) -> &'static str {
        match self {
            Category::Store(_) => "attribute store",
            Category::Record(_) => "record",
            Category::Tree(_) => "tree",
            Category::Scalar(Value::Null) => "null",
            Category::Scalar(Value::Bool(_)) => "boolean",
            Category::Scalar(Value::Number(_)) => "number",
            Category::Scalar(Value::String(_)) => "string",
            Category::Scalar(Value::Array(_)) => "list",
            Category::Scalar(Value::Object(_)) => "object",
        }
    }

    /// The attribute store, if this category holds one.
    pub fn as_store(&self) -> Option<&AttributeStore> {
        match self {
            Category::Store(store) => Some(store),
            _ => None,
        }
    }

    /// The string, if this category is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Category::Scalar(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<AttributeStore> for Category {
    fn from(store: AttributeStore) -> Self {
        Category::Store(store)
    }
}

impl From<HierarchicalRecord> for Category {
    fn from(record: HierarchicalRecord) -> Self {
        Category::Record(record)
    }
}

impl From<AutoVivifyingMap> for Category {
    fn from(tree: AutoVivifyingMap) -> Self {
        Category::Tree(tree)
    }
}

impl From<Map<String, Value>> for Category {
    fn from(map: Map<String, Value>) -> Self {
        Category::Store(AttributeStore::from_map(map))
    }
}

/// JSON objects become attribute stores; everything else is kept as a scalar.
impl From<Value> for Category {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Category::from(map),
            other => Category::Scalar(other),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::Scalar(Value::String(value.to_string()))
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::Scalar(Value::String(value))
    }
}

/// Metadata for one sample, keyed by category name.
///
/// Reading a category that does not exist creates an empty
/// [`AttributeStore`] under that name, so pipeline stages can write
/// `record.attrs("general")?.set(...)` without declaring categories first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HierarchicalRecord {
    datastore: IndexMap<String, Category>,
}

impl HierarchicalRecord {
    /// Creates a record with no categories.
    pub fn new() -> Self {
        HierarchicalRecord {
            datastore: IndexMap::new(),
        }
    }

    /// Returns the category, inserting an empty attribute store if it is missing.
    pub fn get(&mut self, category: &str) -> &mut Category {
        self.datastore
            .entry(category.to_string())
            .or_insert_with(|| Category::Store(AttributeStore::new()))
    }

    /// Returns the attribute store for a category, creating it if missing.
    pub fn attrs(&mut self, category: &str) -> Result<&mut AttributeStore, MetadataError> {
        match self.get(category) {
            Category::Store(store) => Ok(store),
            _ => Err(MetadataError::NotAStore(category.to_string())),
        }
    }

    /// Returns the scratch tree for a category, creating it if missing.
    pub fn scratch(&mut self, category: &str) -> Result<&mut AutoVivifyingMap, MetadataError> {
        let slot = self
            .datastore
            .entry(category.to_string())
            .or_insert_with(|| Category::Tree(AutoVivifyingMap::new()));
        match slot {
            Category::Tree(tree) => Ok(tree),
            _ => Err(MetadataError::NotABranch(category.to_string())),
        }
    }

    /// Reads a category without creating it.
    pub fn peek(&self, category: &str) -> Option<&Category> {
        self.datastore.get(category)
    }

    /// Stores a category. JSON objects are wrapped in an [`AttributeStore`].
    pub fn set(&mut self, category: impl Into<String>, value: impl Into<Category>) {
        self.datastore.insert(category.into(), value.into());
    }

    /// Removes a category and returns what it held.
    pub fn delete(&mut self, category: &str) -> Result<Category, MetadataError> {
        self.datastore
            .shift_remove(category)
            .ok_or_else(|| MetadataError::MissingKey(category.to_string()))
    }

    /// Whether the category exists, without creating it.
    pub fn contains(&self, category: &str) -> bool {
        self.datastore.contains_key(category)
    }

    /// The sample name recorded in the `name` category, if any.
    pub fn name(&self) -> Option<&str> {
        self.peek("name").and_then(Category::as_str)
    }

    /// Category names in insertion order.
    pub fn categories(&self) -> impl Iterator<Item = &String> {
        self.datastore.keys()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.datastore.len()
    }

    /// Whether the record has no categories.
    pub fn is_empty(&self) -> bool {
        self.datastore.is_empty()
    }

    /// Rebuilds a record from a persisted snapshot.
    pub fn from_snapshot(snapshot: Map<String, Value>) -> Self {
        let mut record = HierarchicalRecord::new();
        for (category, value) in snapshot {
            record.set(category, value);
        }
        record
    }

    /// Converts the record into a plain JSON object.
    ///
    /// Categories that cannot be represented (numbers, lists, booleans at
    /// category level) are logged and written as empty objects.
    pub fn serialize(&self) -> Map<String, Value> {
        match self.serialize_with(false) {
            Ok(map) => map,
            // Forgiving mode never returns an error.
            Err(_) => Map::new(),
        }
    }

    /// Like [`serialize`](Self::serialize), but fails on the first category
    /// that cannot be represented.
    pub fn try_serialize(&self) -> Result<Map<String, Value>, MetadataError> {
        self.serialize_with(true)
    }

    fn serialize_with(&self, strict: bool) -> Result<Map<String, Value>, MetadataError> {
        let mut metadata = Map::new();
        for (name, category) in &self.datastore {
            if name.starts_with(RESERVED_PREFIX) {
                metadata.insert(name.clone(), Value::Object(Map::new()));
                continue;
            }
            let value = match category {
                Category::Scalar(Value::String(s)) => Value::String(s.clone()),
                Category::Store(store) => Value::Object(store.datastore().clone()),
                Category::Record(record) => Value::Object(record.serialize_with(strict)?),
                Category::Tree(tree) => tree.to_json(),
                other => {
                    let reason = format!("a {} has no attribute store", other.kind());
                    if strict {
                        return Err(MetadataError::Unserializable {
                            category: name.clone(),
                            reason,
                        });
                    }
                    warn!("Cannot serialize category '{}': {}", name, reason);
                    Value::Object(Map::new())
                }
            };
            metadata.insert(name.clone(), value);
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn populated_record() -> HierarchicalRecord {
        let mut record = HierarchicalRecord::new();
        record.set("name", "2015-SEQ-001");
        let general = record.attrs("general").unwrap();
        general.set("outputdirectory", "/data/2015-SEQ-001");
        general.set("fastqfiles", json!(["a_R1.fastq", "a_R2.fastq"]));
        record.attrs("assembly").unwrap().set("contigs", 0);
        record
    }

    #[test]
    fn test_missing_category_is_created_once() {
        let mut record = HierarchicalRecord::new();
        let first = record.attrs("general").unwrap() as *const AttributeStore;
        assert_eq!(record.peek("general"), Some(&Category::Store(AttributeStore::new())));
        let second = record.attrs("general").unwrap() as *const AttributeStore;
        assert!(std::ptr::eq(first, second));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_mutations_persist_through_get() {
        let mut record = HierarchicalRecord::new();
        record.attrs("general").unwrap().set("status", "running");
        assert_eq!(
            record.attrs("general").unwrap().get("status"),
            &json!("running")
        );
    }

    #[test]
    fn test_set_wraps_objects() {
        let mut record = HierarchicalRecord::new();
        record.set("general", json!({"status": "complete"}));
        record.set("run", json!(["not", "a", "store"]));
        assert!(record.peek("general").unwrap().as_store().is_some());
        assert_eq!(
            record.peek("run"),
            Some(&Category::Scalar(json!(["not", "a", "store"])))
        );
        assert!(record.attrs("run").is_err());
    }

    #[test]
    fn test_serialize() {
        let mut record = populated_record();
        record.set("__internal", "hidden");
        record
            .scratch("kmers")
            .unwrap()
            .path(&["k31"])
            .unwrap()
            .set("unique", 7);
        let mut nested = HierarchicalRecord::new();
        nested.attrs("inner").unwrap().set("x", 1);
        record.set("nested", nested);

        assert_eq!(
            Value::Object(record.serialize()),
            json!({
                "name": "2015-SEQ-001",
                "general": {
                    "outputdirectory": "/data/2015-SEQ-001",
                    "fastqfiles": ["a_R1.fastq", "a_R2.fastq"]
                },
                "assembly": {"contigs": 0},
                "__internal": {},
                "kmers": {"k31": {"unique": 7}},
                "nested": {"inner": {"x": 1}}
            })
        );
    }

    #[test]
    fn test_reserved_category_dumps_empty() {
        let mut record = HierarchicalRecord::new();
        record.set("__internal", "hidden");
        record.attrs("general").unwrap().set("x", 1);
        let dumped = record.serialize();
        assert_eq!(dumped.get("__internal"), Some(&json!({})));
        assert_eq!(dumped.get("general"), Some(&json!({"x": 1})));
        assert_eq!(record.try_serialize().unwrap(), dumped);
    }

    #[test]
    fn test_serialize_soft_failure() {
        let mut record = populated_record();
        record.set("files", json!(["x.fasta"]));
        record.set("count", json!(3));
        let dumped = record.serialize();
        assert_eq!(dumped["files"], json!({}));
        assert_eq!(dumped["count"], json!({}));
        assert_eq!(dumped["name"], json!("2015-SEQ-001"));
    }

    #[test]
    fn test_try_serialize_strict() {
        let mut record = populated_record();
        assert!(record.try_serialize().is_ok());
        record.set("files", json!(["x.fasta"]));
        match record.try_serialize() {
            Err(MetadataError::Unserializable { category, .. }) => assert_eq!(category, "files"),
            other => panic!("expected strict failure, got {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_round_trip() {
        let record = populated_record();
        let dumped = record.serialize();
        let reloaded = HierarchicalRecord::from_snapshot(dumped.clone());
        assert_eq!(reloaded.serialize(), dumped);
        assert_eq!(reloaded.name(), Some("2015-SEQ-001"));
    }

    #[test]
    fn test_delete_category() {
        let mut record = populated_record();
        assert!(record.delete("assembly").is_ok());
        assert!(!record.contains("assembly"));
        assert_eq!(
            record.delete("assembly"),
            Err(MetadataError::MissingKey("assembly".to_string()))
        );
    }
}
