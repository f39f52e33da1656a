#![forbid(unsafe_code)]

pub mod core;
pub mod error;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    CoreError, DeleteMutation, Document, DocumentKey, DocumentState, FieldMask, FieldPath,
    FieldTransform, FieldValue, InvalidId, Limits, MaybeDocument, Mutation, MutationResult,
    NoDocument, ObjectValue, PatchMutation, Precondition, RangeError, SetMutation, Timestamp,
    TransformMutation, TransformOperation, UnknownDocument, Version, VerifyMutation,
};
