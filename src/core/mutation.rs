//! Layer 6: Mutations
//!
//! Deterministic application of queued edits to document snapshots: the
//! remote view once the server has committed a mutation, and the speculative
//! local view while it is still in flight.
//!
//! INVARIANT: apply paths only ever see snapshots for the mutation's own
//! key. Violations are caller bugs (queue/cache layers) and abort.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::document::{Document, DocumentState, MaybeDocument, NoDocument, UnknownDocument};
use super::key::DocumentKey;
use super::path::FieldMask;
use super::precondition::Precondition;
use super::time::{Timestamp, Version};
use super::transform::FieldTransform;
use super::value::{FieldValue, ObjectValue};

/// Server acknowledgement of one mutation.
///
/// `transform_results` is present iff the mutation carried transforms: one
/// resolved value per transform, in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    pub version: Version,
    pub transform_results: Option<Vec<FieldValue>>,
}

impl MutationResult {
    pub fn new(version: Version, transform_results: Option<Vec<FieldValue>>) -> Self {
        Self {
            version,
            transform_results,
        }
    }
}

/// Replace the whole document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetMutation {
    pub key: DocumentKey,
    pub value: ObjectValue,
    pub precondition: Precondition,
}

impl SetMutation {
    pub fn new(key: DocumentKey, value: ObjectValue, precondition: Precondition) -> Self {
        Self {
            key,
            value,
            precondition,
        }
    }

    fn apply_to_remote_document(&self, _maybe_doc: Option<&MaybeDocument>, mutation_result: &MutationResult) -> MaybeDocument {
        // The server accepted the write, so its precondition held there; the
        // replacement value fully determines the result regardless of what
        // the cache holds.
        Document::new(
            self.value.clone(),
            self.key.clone(),
            mutation_result.version,
            DocumentState::CommittedMutations,
        )
        .into()
    }

    fn apply_to_local_view(&self, maybe_doc: Option<&MaybeDocument>) -> Option<MaybeDocument> {
        if !self.precondition.is_valid_for(maybe_doc) {
            return maybe_doc.cloned();
        }
        Some(
            Document::new(
                self.value.clone(),
                self.key.clone(),
                post_mutation_version(maybe_doc),
                DocumentState::LocalMutations,
            )
            .into(),
        )
    }
}

/// Merge specific fields, guided by a mask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchMutation {
    pub key: DocumentKey,
    pub value: ObjectValue,
    pub mask: FieldMask,
    pub precondition: Precondition,
}

impl PatchMutation {
    pub fn new(
        key: DocumentKey,
        value: ObjectValue,
        mask: FieldMask,
        precondition: Precondition,
    ) -> Self {
        Self {
            key,
            value,
            mask,
            precondition,
        }
    }

    fn apply_to_remote_document(&self, maybe_doc: Option<&MaybeDocument>, mutation_result: &MutationResult) -> MaybeDocument {
        if !self.precondition.is_valid_for(maybe_doc) {
            // The server only acknowledges writes whose precondition matched
            // there, so the cached copy must be stale. Record that something
            // committed at the ack version without guessing at the content.
            debug!(
                key = %self.key,
                version = mutation_result.version.as_u64(),
                "patch precondition no longer matches the cached copy; recording an unknown document"
            );
            return UnknownDocument::new(self.key.clone(), mutation_result.version).into();
        }
        Document::new(
            self.patch_document(maybe_doc),
            self.key.clone(),
            mutation_result.version,
            DocumentState::CommittedMutations,
        )
        .into()
    }

    fn apply_to_local_view(&self, maybe_doc: Option<&MaybeDocument>) -> Option<MaybeDocument> {
        if !self.precondition.is_valid_for(maybe_doc) {
            return maybe_doc.cloned();
        }
        Some(
            Document::new(
                self.patch_document(maybe_doc),
                self.key.clone(),
                post_mutation_version(maybe_doc),
                DocumentState::LocalMutations,
            )
            .into(),
        )
    }

    /// Start from the existing data when a materialized document is there,
    /// else from an empty tree.
    fn patch_document(&self, maybe_doc: Option<&MaybeDocument>) -> ObjectValue {
        let base = match maybe_doc {
            Some(MaybeDocument::Document(doc)) => doc.data().clone(),
            _ => ObjectValue::empty(),
        };
        self.patch_object(base)
    }

    /// Mask paths present in the patch value are copied; mask paths absent
    /// from it are deleted.
    fn patch_object(&self, mut data: ObjectValue) -> ObjectValue {
        for path in self.mask.iter() {
            data = match self.value.get(path) {
                Some(new_value) => data.set(path, new_value.clone()),
                None => data.delete(path),
            };
        }
        data
    }
}

/// Delete the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMutation {
    pub key: DocumentKey,
    pub precondition: Precondition,
}

impl DeleteMutation {
    pub fn new(key: DocumentKey, precondition: Precondition) -> Self {
        Self { key, precondition }
    }

    fn apply_to_remote_document(&self, _maybe_doc: Option<&MaybeDocument>, mutation_result: &MutationResult) -> MaybeDocument {
        // The server accepted, so its precondition held there; the document
        // is gone as of the commit version.
        NoDocument::new(self.key.clone(), mutation_result.version, true).into()
    }

    fn apply_to_local_view(&self, maybe_doc: Option<&MaybeDocument>) -> Option<MaybeDocument> {
        if !self.precondition.is_valid_for(maybe_doc) {
            return maybe_doc.cloned();
        }
        Some(NoDocument::new(self.key.clone(), Version::NONE, false).into())
    }
}

/// Transaction-only existence assertion.
///
/// Resolved during transaction commit, before the apply layer; reaching
/// either apply path is a contract violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyMutation {
    pub key: DocumentKey,
    pub precondition: Precondition,
}

impl VerifyMutation {
    pub fn new(key: DocumentKey, precondition: Precondition) -> Self {
        Self { key, precondition }
    }
}

/// Adjust specific fields with transform operations (increment, server
/// timestamp, array union/remove).
///
/// Transforms are only defined for documents the client and server already
/// believe exist, so the precondition is fixed at `Exists(true)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformMutation {
    pub key: DocumentKey,
    pub field_transforms: Vec<FieldTransform>,
}

impl TransformMutation {
    pub fn new(key: DocumentKey, field_transforms: Vec<FieldTransform>) -> Self {
        Self {
            key,
            field_transforms,
        }
    }

    pub fn precondition(&self) -> Precondition {
        Precondition::Exists(true)
    }

    fn apply_to_remote_document(&self, maybe_doc: Option<&MaybeDocument>, mutation_result: &MutationResult) -> MaybeDocument {
        let transform_results = match &mutation_result.transform_results {
            Some(results) => results,
            None => panic!(
                "transform results missing from the acknowledgement for {}",
                self.key
            ),
        };

        if !self.precondition().is_valid_for(maybe_doc) {
            // The mutation was not rejected, so the precondition matched on
            // the server. The cached copy must therefore be stale; record
            // that something committed at the ack version without guessing
            // at the content.
            debug!(
                key = %self.key,
                version = mutation_result.version.as_u64(),
                "transform precondition no longer matches the cached copy; recording an unknown document"
            );
            return UnknownDocument::new(self.key.clone(), mutation_result.version).into();
        }

        let doc = expect_existing_document(maybe_doc);
        let results = self.server_transform_results(transform_results);
        let new_data = self.transform_object(doc.data().clone(), results);
        Document::new(
            new_data,
            self.key.clone(),
            mutation_result.version,
            DocumentState::CommittedMutations,
        )
        .into()
    }

    fn apply_to_local_view(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        base_doc: Option<&MaybeDocument>,
        local_write_time: Timestamp,
    ) -> Option<MaybeDocument> {
        if !self.precondition().is_valid_for(maybe_doc) {
            return maybe_doc.cloned();
        }

        let doc = expect_existing_document(maybe_doc);
        let results = self.local_transform_results(base_doc, local_write_time);
        let new_data = self.transform_object(doc.data().clone(), results);
        // Local views keep the document's own key and version - a server
        // version is never fabricated on this path.
        Some(
            Document::new(
                new_data,
                doc.key().clone(),
                doc.version(),
                DocumentState::LocalMutations,
            )
            .into(),
        )
    }

    /// Server-resolved values, 1:1 with the transforms in declaration
    /// order. Each result was computed independently by the server; none of
    /// them sees the others.
    fn server_transform_results(&self, transform_results: &[FieldValue]) -> Vec<FieldValue> {
        assert_eq!(
            transform_results.len(),
            self.field_transforms.len(),
            "server returned {} transform results for {} transforms on {}",
            transform_results.len(),
            self.field_transforms.len(),
            self.key
        );
        transform_results.to_vec()
    }

    /// One estimate per transform, seeded from the pre-mutation baseline so
    /// recomputation never compounds the client's own pending edits.
    fn local_transform_results(
        &self,
        base_doc: Option<&MaybeDocument>,
        local_write_time: Timestamp,
    ) -> Vec<FieldValue> {
        self.field_transforms
            .iter()
            .map(|transform| {
                let previous = base_doc
                    .and_then(MaybeDocument::as_document)
                    .and_then(|doc| doc.field(&transform.path));
                transform.operation.apply_to_local_view(previous, local_write_time)
            })
            .collect()
    }

    /// Apply each resolved value at its path. Later entries win when paths
    /// overlap.
    fn transform_object(&self, data: ObjectValue, results: Vec<FieldValue>) -> ObjectValue {
        self.field_transforms
            .iter()
            .zip(results)
            .fold(data, |acc, (transform, value)| acc.set(&transform.path, value))
    }
}

/// Closed set of mutation variants.
///
/// Kept closed so every apply site stays exhaustively checked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    Set(SetMutation),
    Patch(PatchMutation),
    Delete(DeleteMutation),
    Verify(VerifyMutation),
    Transform(TransformMutation),
}

impl Mutation {
    pub fn key(&self) -> &DocumentKey {
        match self {
            Mutation::Set(m) => &m.key,
            Mutation::Patch(m) => &m.key,
            Mutation::Delete(m) => &m.key,
            Mutation::Verify(m) => &m.key,
            Mutation::Transform(m) => &m.key,
        }
    }

    pub fn precondition(&self) -> Precondition {
        match self {
            Mutation::Set(m) => m.precondition,
            Mutation::Patch(m) => m.precondition,
            Mutation::Delete(m) => m.precondition,
            Mutation::Verify(m) => m.precondition,
            Mutation::Transform(m) => m.precondition(),
        }
    }

    pub fn field_transforms(&self) -> &[FieldTransform] {
        match self {
            Mutation::Transform(m) => &m.field_transforms,
            _ => &[],
        }
    }

    /// Remote view: reproduce, bit for bit, what the server computed when it
    /// durably committed this mutation. Called exactly once per mutation,
    /// by the write-acknowledgement handler.
    pub fn apply_to_remote_document(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        mutation_result: &MutationResult,
    ) -> MaybeDocument {
        self.verify_key_matches(maybe_doc);
        match self {
            Mutation::Set(m) => m.apply_to_remote_document(maybe_doc, mutation_result),
            Mutation::Patch(m) => m.apply_to_remote_document(maybe_doc, mutation_result),
            Mutation::Delete(m) => m.apply_to_remote_document(maybe_doc, mutation_result),
            Mutation::Verify(_) => panic!(
                "verify mutation for {} reached the remote apply path; verifies resolve during transaction commit",
                self.key()
            ),
            Mutation::Transform(m) => m.apply_to_remote_document(maybe_doc, mutation_result),
        }
    }

    /// Local view: speculative state while the write is in flight. May be
    /// recomputed any number of times. `base_doc` is the snapshot before any
    /// of the client's own pending mutations were applied. Returns `None`
    /// only when the caller should treat the key as having no known
    /// document.
    pub fn apply_to_local_view(
        &self,
        maybe_doc: Option<&MaybeDocument>,
        base_doc: Option<&MaybeDocument>,
        local_write_time: Timestamp,
    ) -> Option<MaybeDocument> {
        self.verify_key_matches(maybe_doc);
        match self {
            Mutation::Set(m) => m.apply_to_local_view(maybe_doc),
            Mutation::Patch(m) => m.apply_to_local_view(maybe_doc),
            Mutation::Delete(m) => m.apply_to_local_view(maybe_doc),
            Mutation::Verify(_) => panic!(
                "verify mutation for {} reached the local apply path; verifies resolve during transaction commit",
                self.key()
            ),
            Mutation::Transform(m) => m.apply_to_local_view(maybe_doc, base_doc, local_write_time),
        }
    }

    /// Callers must only pass snapshots for the mutation's own key.
    fn verify_key_matches(&self, maybe_doc: Option<&MaybeDocument>) {
        if let Some(doc) = maybe_doc {
            assert!(
                doc.key() == self.key(),
                "mutation for {} applied to a snapshot of {}",
                self.key(),
                doc.key()
            );
        }
    }
}

impl From<SetMutation> for Mutation {
    fn from(m: SetMutation) -> Self {
        Mutation::Set(m)
    }
}

impl From<PatchMutation> for Mutation {
    fn from(m: PatchMutation) -> Self {
        Mutation::Patch(m)
    }
}

impl From<DeleteMutation> for Mutation {
    fn from(m: DeleteMutation) -> Self {
        Mutation::Delete(m)
    }
}

impl From<VerifyMutation> for Mutation {
    fn from(m: VerifyMutation) -> Self {
        Mutation::Verify(m)
    }
}

impl From<TransformMutation> for Mutation {
    fn from(m: TransformMutation) -> Self {
        Mutation::Transform(m)
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Set(m) => write!(
                f,
                "SetMutation(key={}, precondition={:?}, value={:?})",
                m.key, m.precondition, m.value
            ),
            Mutation::Patch(m) => write!(
                f,
                "PatchMutation(key={}, mask={:?}, precondition={:?}, value={:?})",
                m.key, m.mask, m.precondition, m.value
            ),
            Mutation::Delete(m) => write!(
                f,
                "DeleteMutation(key={}, precondition={:?})",
                m.key, m.precondition
            ),
            Mutation::Verify(m) => write!(
                f,
                "VerifyMutation(key={}, precondition={:?})",
                m.key, m.precondition
            ),
            Mutation::Transform(m) => write!(
                f,
                "TransformMutation(key={}, transforms={:?})",
                m.key, m.field_transforms
            ),
        }
    }
}

/// Version for a locally-applied result: the existing document's version,
/// or none when nothing materialized was there. Local views never fabricate
/// a server version.
fn post_mutation_version(maybe_doc: Option<&MaybeDocument>) -> Version {
    match maybe_doc {
        Some(MaybeDocument::Document(doc)) => doc.version(),
        _ => Version::NONE,
    }
}

/// The precondition proved existence, so anything but a materialized
/// document is a broken invariant upstream.
fn expect_existing_document(maybe_doc: Option<&MaybeDocument>) -> &Document {
    match maybe_doc {
        Some(doc) => doc.expect_document(),
        None => panic!("matched an exists precondition with no document snapshot"),
    }
}
