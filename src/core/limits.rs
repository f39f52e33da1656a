//! Layer 7: Mutation validation limits (normative defaults).

use serde::{Deserialize, Serialize};

use super::error::{CoreError, RangeError};
use super::mutation::Mutation;
use super::path::FieldPath;

/// Limits the queue layer enforces before accepting a mutation.
///
/// Values are intentionally explicit about their units to avoid confusion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_key_segments: usize,
    pub max_field_path_segments: usize,
    pub max_field_segment_bytes: usize,
    pub max_transforms_per_mutation: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_key_segments: 100,
            max_field_path_segments: 100,
            max_field_segment_bytes: 1_500,
            max_transforms_per_mutation: 500,
        }
    }
}

impl Limits {
    /// Queue-side input validation. Recoverable, unlike the apply-path
    /// invariant guards.
    pub fn check_mutation(&self, mutation: &Mutation) -> Result<(), CoreError> {
        check(
            "document key segments",
            mutation.key().segments().len(),
            self.max_key_segments,
        )?;

        let transforms = mutation.field_transforms();
        check(
            "transforms per mutation",
            transforms.len(),
            self.max_transforms_per_mutation,
        )?;
        for transform in transforms {
            self.check_field_path(&transform.path)?;
        }

        if let Mutation::Patch(patch) = mutation {
            for path in patch.mask.iter() {
                self.check_field_path(path)?;
            }
        }

        Ok(())
    }

    pub fn check_field_path(&self, path: &FieldPath) -> Result<(), CoreError> {
        check(
            "field path segments",
            path.len(),
            self.max_field_path_segments,
        )?;
        for segment in path.segments() {
            check(
                "field segment bytes",
                segment.len(),
                self.max_field_segment_bytes,
            )?;
        }
        Ok(())
    }
}

fn check(field: &'static str, value: usize, max: usize) -> Result<(), CoreError> {
    if value > max {
        return Err(RangeError { field, value, max }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::DocumentKey;
    use crate::core::mutation::TransformMutation;
    use crate::core::transform::{FieldTransform, TransformOperation};
    use serde_json::json;

    fn key() -> DocumentKey {
        DocumentKey::parse("users/42").unwrap()
    }

    #[test]
    fn limits_defaults_are_pinned() {
        let limits = Limits::default();
        assert_eq!(limits.max_key_segments, 100);
        assert_eq!(limits.max_field_path_segments, 100);
        assert_eq!(limits.max_field_segment_bytes, 1_500);
        assert_eq!(limits.max_transforms_per_mutation, 500);
    }

    #[test]
    fn within_limits_passes() {
        let mutation: Mutation = TransformMutation::new(
            key(),
            vec![FieldTransform::new(
                FieldPath::parse("count").unwrap(),
                TransformOperation::Increment(json!(1)),
            )],
        )
        .into();
        assert!(Limits::default().check_mutation(&mutation).is_ok());
    }

    #[test]
    fn too_many_transforms_is_a_range_error() {
        let transform = FieldTransform::new(
            FieldPath::parse("count").unwrap(),
            TransformOperation::Increment(json!(1)),
        );
        let mutation: Mutation = TransformMutation::new(key(), vec![transform; 501]).into();
        let err = Limits::default().check_mutation(&mutation).unwrap_err();
        assert!(matches!(err, CoreError::Range(_)));
    }

    #[test]
    fn oversized_field_segment_is_a_range_error() {
        let limits = Limits {
            max_field_segment_bytes: 4,
            ..Limits::default()
        };
        let path = FieldPath::parse("toolong").unwrap();
        assert!(limits.check_field_path(&path).is_err());
    }
}
