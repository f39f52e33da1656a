//! Core capability errors (parsing, validation).
//!
//! These are bounded and stable: they represent domain/refusal states the
//! caller can act on. Broken caller invariants on the apply paths are
//! panics, not errors.

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Invalid identifier.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("document key `{raw}` is invalid: {reason}")]
    Key { raw: String, reason: String },
    #[error("field path `{raw}` is invalid: {reason}")]
    FieldPath { raw: String, reason: String },
}

/// Generic size/count violation against configured limits.
#[derive(Debug, Error, Clone)]
#[error("{field} is {value}, above the limit of {max}")]
pub struct RangeError {
    pub field: &'static str,
    pub value: usize,
    pub max: usize,
}

/// Canonical error enum for the model capability.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error(transparent)]
    Range(#[from] RangeError),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        // Core errors are pure domain/input failures.
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}
