//! Layer 1: Field paths
//!
//! FieldPath: segments naming a location inside a document's field tree.
//! FieldMask: the set of paths a patch touches.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, InvalidId};

/// Ordered, non-empty segments into the field tree.
///
/// Immutable once constructed. Canonical string form joins segments with
/// dots.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Validate segments: at least one, none empty.
    pub fn new(segments: Vec<String>) -> Result<Self, CoreError> {
        if segments.is_empty() {
            return Err(InvalidId::FieldPath {
                raw: String::new(),
                reason: "empty path".into(),
            }
            .into());
        }
        if segments.iter().any(String::is_empty) {
            return Err(InvalidId::FieldPath {
                raw: segments.join("."),
                reason: "empty segment".into(),
            }
            .into());
        }
        Ok(Self(segments))
    }

    /// Parse a dotted path: `a.b.c`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if raw.is_empty() {
            return Err(InvalidId::FieldPath {
                raw: raw.to_string(),
                reason: "empty path".into(),
            }
            .into());
        }
        let mut segments = Vec::new();
        for seg in raw.split('.') {
            if seg.is_empty() {
                return Err(InvalidId::FieldPath {
                    raw: raw.to_string(),
                    reason: "empty segment".into(),
                }
                .into());
            }
            segments.push(seg.to_string());
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Paths are never empty; kept for slice-like call sites.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `self` names `other` or an ancestor of it.
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        self.0.len() <= other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a == b)
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldPath({:?})", self.0.join("."))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// The set of field paths a patch mutation touches.
///
/// Paths outside the mask are untouched; paths inside the mask are copied
/// from the patch data or deleted when absent there.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMask(BTreeSet<FieldPath>);

impl FieldMask {
    pub fn new(paths: impl IntoIterator<Item = FieldPath>) -> Self {
        Self(paths.into_iter().collect())
    }

    /// True when the mask names `path` or an ancestor of it.
    pub fn covers(&self, path: &FieldPath) -> bool {
        self.0.iter().any(|mask_path| mask_path.is_prefix_of(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn parse_roundtrips_canonical_form() {
        assert_eq!(path("a.b.c").to_string(), "a.b.c");
        assert_eq!(path("count").segments(), ["count"]);
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse(".a").is_err());
        assert!(FieldPath::new(vec![]).is_err());
        assert!(FieldPath::new(vec!["a".into(), "".into()]).is_err());
    }

    #[test]
    fn prefix_includes_self_and_ancestors() {
        assert!(path("a").is_prefix_of(&path("a.b")));
        assert!(path("a.b").is_prefix_of(&path("a.b")));
        assert!(!path("a.b").is_prefix_of(&path("a")));
        assert!(!path("a.b").is_prefix_of(&path("a.c")));
    }

    #[test]
    fn mask_covers_named_paths_and_children() {
        let mask = FieldMask::new([path("a.b"), path("x")]);
        assert!(mask.covers(&path("a.b")));
        assert!(mask.covers(&path("a.b.c")));
        assert!(mask.covers(&path("x")));
        assert!(!mask.covers(&path("a")));
        assert!(!mask.covers(&path("y")));
    }
}
