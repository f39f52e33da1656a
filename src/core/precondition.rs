//! Layer 4: Preconditions
//!
//! Guard restricting the document states under which a mutation takes
//! effect.

use serde::{Deserialize, Serialize};

use super::document::MaybeDocument;
use super::time::Version;

/// Predicate over an optional document snapshot.
///
/// Immutable value type; evaluation is pure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precondition {
    /// Always matches.
    None,
    /// The document must be materialized (true) or absent/deleted (false).
    Exists(bool),
    /// The document must be materialized at exactly this version.
    UpdateTime(Version),
}

impl Precondition {
    pub fn exists(exists: bool) -> Self {
        Precondition::Exists(exists)
    }

    pub fn update_time(version: Version) -> Self {
        Precondition::UpdateTime(version)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Precondition::None)
    }

    /// Pure predicate: no side effects, no allocation.
    ///
    /// `None` (the argument) means the key was never observed, which
    /// satisfies `Exists(false)` but nothing version-shaped.
    pub fn is_valid_for(&self, maybe_doc: Option<&MaybeDocument>) -> bool {
        match self {
            Precondition::None => true,
            Precondition::Exists(true) => {
                matches!(maybe_doc, Some(MaybeDocument::Document(_)))
            }
            Precondition::Exists(false) => {
                matches!(maybe_doc, None | Some(MaybeDocument::NoDocument(_)))
            }
            Precondition::UpdateTime(version) => match maybe_doc {
                Some(MaybeDocument::Document(doc)) => doc.version() == *version,
                _ => false,
            },
        }
    }
}
