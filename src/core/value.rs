//! Layer 2: Field values
//!
//! ObjectValue: the root field tree of a document. Reads borrow; writes
//! return a fresh tree. Snapshots never share mutable structure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::path::FieldPath;

/// A single value in the field tree.
pub type FieldValue = Value;

/// Root mapping of a document's fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectValue(Map<String, Value>);

impl ObjectValue {
    pub fn empty() -> Self {
        Self(Map::new())
    }

    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Read the value at `path`, if every parent on the way is an object.
    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        let mut cursor = &self.0;
        let (leaf, parents) = path.segments().split_last()?;
        for seg in parents {
            cursor = cursor.get(seg)?.as_object()?;
        }
        cursor.get(leaf)
    }

    /// New tree with `value` at `path`. Intermediate segments become nested
    /// objects, replacing any non-object value in the way.
    pub fn set(&self, path: &FieldPath, value: FieldValue) -> ObjectValue {
        let mut root = self.0.clone();
        set_in(&mut root, path.segments(), value);
        ObjectValue(root)
    }

    /// New tree with the value at `path` removed. A missing parent leaves
    /// the tree unchanged.
    pub fn delete(&self, path: &FieldPath) -> ObjectValue {
        let mut root = self.0.clone();
        delete_in(&mut root, path.segments());
        ObjectValue(root)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ObjectValue {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn set_in(map: &mut Map<String, Value>, segments: &[String], value: Value) {
    match segments {
        [] => {}
        [leaf] => {
            map.insert(leaf.clone(), value);
        }
        [first, rest @ ..] => {
            let child = map
                .entry(first.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child_map) = child {
                set_in(child_map, rest, value);
            }
        }
    }
}

fn delete_in(map: &mut Map<String, Value>, segments: &[String]) {
    match segments {
        [] => {}
        [leaf] => {
            map.remove(leaf);
        }
        [first, rest @ ..] => {
            if let Some(Value::Object(child)) = map.get_mut(first) {
                delete_in(child, rest);
            }
        }
    }
}
