//! Layer 5: Field transforms
//!
//! A FieldTransform is a (path, operation) pair whose resolved value depends
//! on server or local context rather than being a literal replacement.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::path::FieldPath;
use super::time::Timestamp;
use super::value::FieldValue;

/// Closed catalog of transform operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOperation {
    /// Resolves to the commit time on the server.
    ServerTimestamp,
    /// Numeric add. The operand must be a number.
    Increment(FieldValue),
    /// Appends operand elements missing from the previous array.
    ArrayUnion(Vec<FieldValue>),
    /// Removes every element equal to an operand element.
    ArrayRemove(Vec<FieldValue>),
}

impl TransformOperation {
    /// Estimate the post-transform value while the write is in flight.
    ///
    /// `previous` is the field's value in the pre-mutation baseline
    /// document, so recomputing a view never compounds the client's own
    /// pending edits. The server's resolved value replaces the estimate
    /// when the acknowledgement arrives.
    pub fn apply_to_local_view(
        &self,
        previous: Option<&FieldValue>,
        local_write_time: Timestamp,
    ) -> FieldValue {
        match self {
            TransformOperation::ServerTimestamp => {
                // Estimate: the queueing wall time as epoch milliseconds.
                Value::from(local_write_time.millis())
            }
            TransformOperation::Increment(operand) => add_numbers(previous, operand),
            TransformOperation::ArrayUnion(elements) => {
                let mut out = base_array(previous);
                for element in elements {
                    if !out.contains(element) {
                        out.push(element.clone());
                    }
                }
                Value::Array(out)
            }
            TransformOperation::ArrayRemove(elements) => {
                let mut out = base_array(previous);
                out.retain(|existing| !elements.contains(existing));
                Value::Array(out)
            }
        }
    }
}

/// A missing or non-array previous value behaves as the empty array.
fn base_array(previous: Option<&FieldValue>) -> Vec<FieldValue> {
    match previous {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Integer + integer stays integral (saturating); any double promotes the
/// result to double; a missing or non-numeric base counts as zero.
fn add_numbers(previous: Option<&FieldValue>, operand: &FieldValue) -> FieldValue {
    let base = match previous {
        Some(v) if v.is_number() => v.clone(),
        _ => Value::from(0),
    };
    match (base.as_i64(), operand.as_i64()) {
        (Some(a), Some(b)) => Value::from(a.saturating_add(b)),
        _ => Value::from(base.as_f64().unwrap_or(0.0) + operand.as_f64().unwrap_or(0.0)),
    }
}

/// A transform applied at one path. Owned by value by its mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldTransform {
    pub path: FieldPath,
    pub operation: TransformOperation,
}

impl FieldTransform {
    pub fn new(path: FieldPath, operation: TransformOperation) -> Self {
        Self { path, operation }
    }
}
