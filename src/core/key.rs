//! Layer 1: Document keys
//!
//! DocumentKey: collection path + document id, e.g. `users/42`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, InvalidId};

/// Location of a document: alternating collection and document segments.
///
/// Always an even number of segments (`users/42`, `users/42/orders/7`).
/// Equality and ordering are by path. Owned by value, copied freely.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(Vec<String>);

impl DocumentKey {
    /// Validate segments: non-empty, even count, no empty segments.
    pub fn new(segments: Vec<String>) -> Result<Self, CoreError> {
        let raw = segments.join("/");
        if segments.is_empty() {
            return Err(InvalidId::Key {
                raw,
                reason: "empty path".into(),
            }
            .into());
        }
        if segments.len() % 2 != 0 {
            return Err(InvalidId::Key {
                raw,
                reason: "odd number of segments (must alternate collection/document)".into(),
            }
            .into());
        }
        if segments.iter().any(String::is_empty) {
            return Err(InvalidId::Key {
                raw,
                reason: "empty segment".into(),
            }
            .into());
        }
        Ok(Self(segments))
    }

    /// Parse a slash-separated path: `users/42`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::new(raw.split('/').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// All segments but the trailing document id.
    pub fn collection_path(&self) -> &[String] {
        &self.0[..self.0.len() - 1]
    }

    pub fn document_id(&self) -> &str {
        // Keys always have at least two segments.
        self.0.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentKey({:?})", self.0.join("/"))
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}
