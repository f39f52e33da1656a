//! End-to-end scenarios: queue a local edit, render the speculative view,
//! then reconcile with the server acknowledgement.

use satchel::{
    DeleteMutation, Document, DocumentKey, DocumentState, FieldMask, FieldPath, FieldTransform,
    Limits, MaybeDocument, Mutation, MutationResult, NoDocument, ObjectValue, PatchMutation,
    Precondition, SetMutation, Timestamp, TransformMutation, TransformOperation, UnknownDocument,
    Version,
};
use serde_json::{json, Value};

const WRITE_TIME: Timestamp = Timestamp(1_700_000_000_000);

fn key(path: &str) -> DocumentKey {
    DocumentKey::parse(path).unwrap()
}

fn field(path: &str) -> FieldPath {
    FieldPath::parse(path).unwrap()
}

fn obj(value: Value) -> ObjectValue {
    match value {
        Value::Object(map) => ObjectValue::new(map),
        other => panic!("expected object literal, got {other}"),
    }
}

fn synced_doc(path: &str, version: u64, data: Value) -> MaybeDocument {
    Document::new(
        obj(data),
        key(path),
        Version::new(version),
        DocumentState::Synced,
    )
    .into()
}

fn ack(version: u64, results: Option<Vec<Value>>) -> MutationResult {
    MutationResult::new(Version::new(version), results)
}

#[test]
fn increment_roundtrip_local_then_remote() {
    // Document {path: "users/42", version: 5, data: {count: 3}}.
    let cached = synced_doc("users/42", 5, json!({"count": 3}));
    let mutation: Mutation = TransformMutation::new(
        key("users/42"),
        vec![FieldTransform::new(
            field("count"),
            TransformOperation::Increment(json!(1)),
        )],
    )
    .into();

    // Speculative view while the write is in flight.
    let local = mutation
        .apply_to_local_view(Some(&cached), Some(&cached), WRITE_TIME)
        .unwrap();
    let local_doc = local.expect_document();
    assert_eq!(local_doc.field(&field("count")), Some(&json!(4)));
    assert_eq!(local_doc.version(), Version::new(5));
    assert_eq!(local_doc.state(), DocumentState::LocalMutations);

    // The server commits at version 6 and resolves the increment to 4.
    let remote = mutation.apply_to_remote_document(Some(&cached), &ack(6, Some(vec![json!(4)])));
    let remote_doc = remote.expect_document();
    assert_eq!(remote_doc.field(&field("count")), Some(&json!(4)));
    assert_eq!(remote_doc.version(), Version::new(6));
    assert_eq!(remote_doc.state(), DocumentState::CommittedMutations);
}

#[test]
fn recomputing_the_local_view_never_compounds_pending_edits() {
    let baseline = synced_doc("users/42", 5, json!({"count": 3}));
    let mutation: Mutation = TransformMutation::new(
        key("users/42"),
        vec![FieldTransform::new(
            field("count"),
            TransformOperation::Increment(json!(1)),
        )],
    )
    .into();

    // First render after queueing.
    let first = mutation
        .apply_to_local_view(Some(&baseline), Some(&baseline), WRITE_TIME)
        .unwrap();
    // Cache invalidation: recompute against the already-speculative view,
    // still seeded from the same baseline.
    let second = mutation
        .apply_to_local_view(Some(&first), Some(&baseline), WRITE_TIME)
        .unwrap();
    assert_eq!(
        second.expect_document().field(&field("count")),
        Some(&json!(4))
    );
}

#[test]
fn stale_cache_at_ack_time_yields_an_unknown_document() {
    // The client deleted its cached copy (or never had one), but the server
    // accepted the transform - its precondition matched server-side state
    // the client never saw.
    let mutation: Mutation = TransformMutation::new(
        key("users/42"),
        vec![FieldTransform::new(
            field("count"),
            TransformOperation::Increment(json!(1)),
        )],
    )
    .into();

    let remote = mutation.apply_to_remote_document(None, &ack(6, Some(vec![json!(4)])));
    assert_eq!(
        remote,
        UnknownDocument::new(key("users/42"), Version::new(6)).into()
    );
}

#[test]
fn server_timestamp_estimate_is_replaced_by_the_resolved_value() {
    let cached = synced_doc("posts/p1", 3, json!({"title": "hello"}));
    let mutation: Mutation = TransformMutation::new(
        key("posts/p1"),
        vec![FieldTransform::new(
            field("updated_at"),
            TransformOperation::ServerTimestamp,
        )],
    )
    .into();

    let local = mutation
        .apply_to_local_view(Some(&cached), Some(&cached), WRITE_TIME)
        .unwrap();
    assert_eq!(
        local.expect_document().field(&field("updated_at")),
        Some(&json!(WRITE_TIME.millis()))
    );

    // The server's clock won: the resolved value differs from the estimate.
    let committed_at = json!(WRITE_TIME.millis() + 40);
    let remote =
        mutation.apply_to_remote_document(Some(&cached), &ack(4, Some(vec![committed_at.clone()])));
    assert_eq!(
        remote.expect_document().field(&field("updated_at")),
        Some(&committed_at)
    );
}

#[test]
fn array_transforms_compose_with_the_cached_array() {
    let cached = synced_doc("posts/p1", 3, json!({"tags": ["a", "b"]}));
    let mutation: Mutation = TransformMutation::new(
        key("posts/p1"),
        vec![
            FieldTransform::new(
                field("tags"),
                TransformOperation::ArrayUnion(vec![json!("b"), json!("c")]),
            ),
        ],
    )
    .into();

    let local = mutation
        .apply_to_local_view(Some(&cached), Some(&cached), WRITE_TIME)
        .unwrap();
    assert_eq!(
        local.expect_document().field(&field("tags")),
        Some(&json!(["a", "b", "c"]))
    );
}

#[test]
fn create_then_patch_then_delete_lifecycle() {
    let k = key("users/7");

    // Create locally: nothing observed yet.
    let create: Mutation = SetMutation::new(
        k.clone(),
        obj(json!({"name": "grace", "active": true})),
        Precondition::None,
    )
    .into();
    let created = create.apply_to_local_view(None, None, WRITE_TIME).unwrap();
    assert_eq!(created.version(), Version::NONE);
    assert!(created.expect_document().has_pending_writes());

    // Server ack materializes the committed view.
    let committed = create.apply_to_remote_document(Some(&created), &ack(10, None));
    assert_eq!(committed.version(), Version::new(10));
    assert_eq!(
        committed.expect_document().state(),
        DocumentState::CommittedMutations
    );

    // Patch a field away and rename another.
    let patch: Mutation = PatchMutation::new(
        k.clone(),
        obj(json!({"name": "hopper"})),
        FieldMask::new([field("name"), field("active")]),
        Precondition::exists(true),
    )
    .into();
    let patched = patch.apply_to_remote_document(Some(&committed), &ack(11, None));
    let patched_doc = patched.expect_document();
    assert_eq!(patched_doc.field(&field("name")), Some(&json!("hopper")));
    assert_eq!(patched_doc.field(&field("active")), None);

    // Delete: speculative first, then committed.
    let delete: Mutation = DeleteMutation::new(k.clone(), Precondition::exists(true)).into();
    let locally_deleted = delete
        .apply_to_local_view(Some(&patched), Some(&patched), WRITE_TIME)
        .unwrap();
    assert_eq!(
        locally_deleted,
        NoDocument::new(k.clone(), Version::NONE, false).into()
    );
    let remotely_deleted = delete.apply_to_remote_document(Some(&patched), &ack(12, None));
    assert_eq!(remotely_deleted, NoDocument::new(k, Version::new(12), true).into());
}

#[test]
fn update_time_precondition_guards_against_concurrent_writers() {
    let cached = synced_doc("users/42", 5, json!({"balance": 100}));
    let patch: Mutation = PatchMutation::new(
        key("users/42"),
        obj(json!({"balance": 90})),
        FieldMask::new([field("balance")]),
        Precondition::update_time(Version::new(4)),
    )
    .into();

    // Locally the version check fails: the edit has no speculative effect.
    assert_eq!(
        patch.apply_to_local_view(Some(&cached), Some(&cached), WRITE_TIME),
        Some(cached.clone())
    );
}

#[test]
fn rejected_oversized_mutations_surface_as_permanent_errors() {
    let transform = FieldTransform::new(
        field("count"),
        TransformOperation::Increment(json!(1)),
    );
    let mutation: Mutation =
        TransformMutation::new(key("users/42"), vec![transform; 501]).into();
    let err = Limits::default().check_mutation(&mutation).unwrap_err();

    let err: satchel::Error = err.into();
    assert!(!err.transience().is_retryable());
    assert_eq!(err.effect().as_str(), "none");
}
