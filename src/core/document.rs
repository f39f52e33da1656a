//! Layer 3: Document snapshots
//!
//! What the client knows about one document: confirmed absent, committed
//! but content unknown, or fully materialized. "Never observed" is the
//! absence of a MaybeDocument, not a variant.

use serde::{Deserialize, Serialize};

use super::key::DocumentKey;
use super::path::FieldPath;
use super::time::Version;
use super::value::{FieldValue, ObjectValue};

/// Provenance of a materialized document's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Matches the server's copy as of the document's version.
    Synced,
    /// Reflects unacknowledged local mutations.
    LocalMutations,
    /// Reflects mutations the server committed but a read has not yet
    /// confirmed.
    CommittedMutations,
}

impl DocumentState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::LocalMutations => "local_mutations",
            Self::CommittedMutations => "committed_mutations",
        }
    }
}

/// Materialized document: field data plus a server version.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    key: DocumentKey,
    version: Version,
    data: ObjectValue,
    state: DocumentState,
}

impl Document {
    pub fn new(data: ObjectValue, key: DocumentKey, version: Version, state: DocumentState) -> Self {
        Self {
            key,
            version,
            data,
            state,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn data(&self) -> &ObjectValue {
        &self.data
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn field(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.data.get(path)
    }

    pub fn has_pending_writes(&self) -> bool {
        !matches!(self.state, DocumentState::Synced)
    }
}

/// Confirmed absent: explicitly deleted or never created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoDocument {
    pub key: DocumentKey,
    pub version: Version,
    /// False while the deletion is only a local, unacknowledged edit.
    pub has_committed_mutations: bool,
}

impl NoDocument {
    pub fn new(key: DocumentKey, version: Version, has_committed_mutations: bool) -> Self {
        Self {
            key,
            version,
            has_committed_mutations,
        }
    }
}

/// Committed, content unknown: the mutation was acknowledged but the cached
/// copy was too stale to reconstruct the result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownDocument {
    pub key: DocumentKey,
    pub version: Version,
}

impl UnknownDocument {
    pub fn new(key: DocumentKey, version: Version) -> Self {
        Self { key, version }
    }
}

/// Closed variant over document knowledge.
///
/// Every variant carries exactly one key and one version. Transitions
/// between variants happen only in the mutation layer; nothing here coerces
/// one variant into another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaybeDocument {
    NoDocument(NoDocument),
    UnknownDocument(UnknownDocument),
    Document(Document),
}

impl MaybeDocument {
    pub fn key(&self) -> &DocumentKey {
        match self {
            MaybeDocument::NoDocument(doc) => &doc.key,
            MaybeDocument::UnknownDocument(doc) => &doc.key,
            MaybeDocument::Document(doc) => doc.key(),
        }
    }

    pub fn version(&self) -> Version {
        match self {
            MaybeDocument::NoDocument(doc) => doc.version,
            MaybeDocument::UnknownDocument(doc) => doc.version,
            MaybeDocument::Document(doc) => doc.version(),
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, MaybeDocument::Document(_))
    }

    pub fn is_no_document(&self) -> bool {
        matches!(self, MaybeDocument::NoDocument(_))
    }

    pub fn is_unknown_document(&self) -> bool {
        matches!(self, MaybeDocument::UnknownDocument(_))
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            MaybeDocument::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Checked refinement to the materialized variant.
    ///
    /// Panics on any other variant: call sites must already have proved the
    /// discriminant (typically via a matched `Exists(true)` precondition),
    /// so reaching the panic means a caller bug, not a runtime condition.
    pub fn expect_document(&self) -> &Document {
        match self {
            MaybeDocument::Document(doc) => doc,
            other => panic!(
                "snapshot for {} is {}, expected a materialized document",
                other.key(),
                other.kind()
            ),
        }
    }

    /// Discriminant name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            MaybeDocument::NoDocument(_) => "no_document",
            MaybeDocument::UnknownDocument(_) => "unknown_document",
            MaybeDocument::Document(_) => "document",
        }
    }
}

impl From<Document> for MaybeDocument {
    fn from(doc: Document) -> Self {
        MaybeDocument::Document(doc)
    }
}

impl From<NoDocument> for MaybeDocument {
    fn from(doc: NoDocument) -> Self {
        MaybeDocument::NoDocument(doc)
    }
}

impl From<UnknownDocument> for MaybeDocument {
    fn from(doc: UnknownDocument) -> Self {
        MaybeDocument::UnknownDocument(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> DocumentKey {
        DocumentKey::parse("users/42").unwrap()
    }

    fn doc() -> Document {
        let map = json!({"count": 3}).as_object().cloned().unwrap_or_default();
        Document::new(
            ObjectValue::new(map),
            key(),
            Version::new(5),
            DocumentState::Synced,
        )
    }

    #[test]
    fn discriminators_are_exclusive() {
        let materialized = MaybeDocument::from(doc());
        assert!(materialized.is_document());
        assert!(!materialized.is_no_document());
        assert!(!materialized.is_unknown_document());

        let absent = MaybeDocument::from(NoDocument::new(key(), Version::new(2), true));
        assert!(absent.is_no_document());
        assert_eq!(absent.kind(), "no_document");
        assert_eq!(absent.version(), Version::new(2));

        let unknown = MaybeDocument::from(UnknownDocument::new(key(), Version::new(6)));
        assert!(unknown.is_unknown_document());
        assert_eq!(unknown.kind(), "unknown_document");
    }

    #[test]
    fn expect_document_refines_the_materialized_variant() {
        let materialized = MaybeDocument::from(doc());
        assert_eq!(materialized.expect_document().version(), Version::new(5));
    }

    #[test]
    #[should_panic(expected = "expected a materialized document")]
    fn expect_document_aborts_on_other_variants() {
        MaybeDocument::from(NoDocument::new(key(), Version::NONE, false)).expect_document();
    }

    #[test]
    fn pending_writes_follow_state() {
        assert!(!doc().has_pending_writes());
        let local = Document::new(
            ObjectValue::empty(),
            key(),
            Version::NONE,
            DocumentState::LocalMutations,
        );
        assert!(local.has_pending_writes());
    }
}
