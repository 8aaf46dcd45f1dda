//! Flat attribute container with lazy-default reads.
//!
//! An [`AttributeStore`] holds the attributes of one metadata category (for
//! example `general` or `assembly`). Unset attributes read back as the
//! sentinel `"NA"`, and the act of reading writes that sentinel into the
//! store, so later consumers that inspect the backing map see it as well.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::MetadataError;

/// Value materialized for attributes that are missing or unset.
pub const SENTINEL: &str = "NA";

/// Display string returned by [`AttributeStore::describe`] for unset attributes.
pub const PLACEHOLDER: &str = "-,";

/// JSON truthiness: null, `false`, zero, and empty strings/arrays/objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Whether a value counts as set: truthy, numeric zero, or an explicit `false`.
pub fn is_meaningful(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(_) => true,
        other => is_truthy(other),
    }
}

fn sentinel() -> Value {
    Value::String(SENTINEL.to_string())
}

/// Renders a value the way it appears in reports: strings raw, everything else as JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Key/value store for the attributes of a single category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeStore {
    datastore: Map<String, Value>,
}

impl AttributeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        AttributeStore {
            datastore: Map::new(),
        }
    }

    /// Creates a store seeded verbatim from a JSON object.
    ///
    /// Seeded values bypass the write-defaulting rule; unset values are
    /// normalized lazily the first time they are read.
    pub fn from_map(datastore: Map<String, Value>) -> Self {
        AttributeStore { datastore }
    }

    /// Reads an attribute, materializing the `"NA"` sentinel if it is missing or unset.
    pub fn get(&mut self, key: &str) -> &Value {
        let slot = self.datastore.entry(key.to_string()).or_insert(Value::Null);
        if !is_meaningful(slot) {
            *slot = sentinel();
        }
        slot
    }

    /// Reads an attribute as a display string (see [`render`]).
    pub fn get_string(&mut self, key: &str) -> String {
        render(self.get(key))
    }

    /// Reads an attribute without any defaulting side effect.
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.datastore.get(key)
    }

    /// Stores an attribute. Unset values (null, empty string/array/object)
    /// are stored as `"NA"`; `false` and zero are kept.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        let stored = if is_meaningful(&value) {
            value
        } else {
            sentinel()
        };
        self.datastore.insert(key.into(), stored);
    }

    /// Removes an attribute and returns its value.
    pub fn delete(&mut self, key: &str) -> Result<Value, MetadataError> {
        self.datastore
            .remove(key)
            .ok_or_else(|| MetadataError::MissingKey(key.to_string()))
    }

    /// Formats an attribute for comma-separated reports.
    ///
    /// Returns `"{value},"` for set attributes and `"-,"` otherwise. A
    /// present-but-unset value is replaced by `"NA"` in the store, as
    /// [`get`](Self::get) would do; a missing key is left missing.
    pub fn describe(&mut self, key: &str) -> String {
        match self.datastore.get_mut(key) {
            None => PLACEHOLDER.to_string(),
            Some(value) if is_meaningful(value) => format!("{},", render(value)),
            Some(value) => {
                *value = sentinel();
                PLACEHOLDER.to_string()
            }
        }
    }

    /// Whether the attribute exists, without any defaulting side effect.
    pub fn contains_key(&self, key: &str) -> bool {
        self.datastore.contains_key(key)
    }

    /// Number of stored attributes.
    pub fn len(&self) -> usize {
        self.datastore.len()
    }

    /// Whether no attributes are stored.
    pub fn is_empty(&self) -> bool {
        self.datastore.is_empty()
    }

    /// Attributes in key order, as stored.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.datastore.iter()
    }

    /// Borrows the backing map.
    pub fn datastore(&self) -> &Map<String, Value> {
        &self.datastore
    }

    /// Consumes the store and returns the backing map.
    pub fn into_datastore(self) -> Map<String, Value> {
        self.datastore
    }
}

impl From<Map<String, Value>> for AttributeStore {
    fn from(datastore: Map<String, Value>) -> Self {
        AttributeStore::from_map(datastore)
    }
}
