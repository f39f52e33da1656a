//! Core mutation-application model (Layers 0-7)
//!
//! Module hierarchy follows type dependency order:
//! - time: Version, Timestamp (Layer 0)
//! - key, path: DocumentKey, FieldPath, FieldMask (Layer 1)
//! - value: FieldValue, ObjectValue (Layer 2)
//! - document: MaybeDocument and its variants (Layer 3)
//! - precondition: Precondition (Layer 4)
//! - transform: TransformOperation, FieldTransform (Layer 5)
//! - mutation: Mutation variants, MutationResult (Layer 6)
//! - limits: Limits (Layer 7)

pub mod document;
pub mod error;
pub mod key;
pub mod limits;
pub mod mutation;
pub mod path;
pub mod precondition;
pub mod time;
pub mod transform;
pub mod value;

pub use document::{Document, DocumentState, MaybeDocument, NoDocument, UnknownDocument};
pub use error::{CoreError, InvalidId, RangeError};
pub use key::DocumentKey;
pub use limits::Limits;
pub use mutation::{
    DeleteMutation, Mutation, MutationResult, PatchMutation, SetMutation, TransformMutation,
    VerifyMutation,
};
pub use path::{FieldMask, FieldPath};
pub use precondition::Precondition;
pub use time::{Timestamp, Version};
pub use transform::{FieldTransform, TransformOperation};
pub use value::{FieldValue, ObjectValue};
