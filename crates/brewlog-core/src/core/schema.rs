// crates/brewlog-core/src/core/schema.rs
// ============================================================================
// Module: Record Schemas
// Description: Compiled JSON Schemas and collection descriptors.
// Purpose: Validate records against one pinned schema per collection.
// Dependencies: jsonschema, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each collection pins a single JSON Schema (Draft 2020-12). A
//! [`CollectionDescriptor`] binds that schema to the collection's tree path and
//! its [`RecordShape`]. Validation failures enumerate every failing instance
//! path so callers can report them field by field.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use crate::core::Record;
use crate::core::path::TreePath;
use crate::core::shape::RecordShape;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while compiling a record schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema document is not a valid Draft 2020-12 schema.
    #[error("invalid record schema: {0}")]
    Invalid(String),
}

/// One failing location within a validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON pointer to the failing instance location (`""` for the root).
    pub path: String,
    /// Human-readable failure description.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Record failed its collection schema.
///
/// # Invariants
/// - `issues` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Collection whose schema rejected the value.
    pub collection: String,
    /// Failing locations.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Builds a validation error with a single issue.
    #[must_use]
    pub fn single(collection: impl Into<String>, issue: ValidationIssue) -> Self {
        Self {
            collection: collection.into(),
            issues: vec![issue],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} record failed validation", self.collection)?;
        for (index, issue) in self.issues.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Compiled JSON Schema for one collection.
#[derive(Clone)]
pub struct RecordSchema {
    /// Source schema document.
    raw: Value,
    /// Compiled validator.
    validator: Arc<Validator>,
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema").field("raw", &self.raw).finish_non_exhaustive()
    }
}

impl RecordSchema {
    /// Compiles a Draft 2020-12 schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Invalid`] when the document does not compile.
    pub fn compile(schema: Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .map_err(|err| SchemaError::Invalid(err.to_string()))?;
        Ok(Self {
            raw: schema,
            validator: Arc::new(validator),
        })
    }

    /// Returns the source schema document.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Returns every failing location for `value`, or an empty list.
    #[must_use]
    pub fn issues(&self, value: &Value) -> Vec<ValidationIssue> {
        self.validator
            .iter_errors(value)
            .map(|err| ValidationIssue {
                path: err.instance_path().to_string(),
                message: err.to_string(),
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Collection Descriptors
// ============================================================================

/// Registration of a collection: where it lives, its schema and its shape.
#[derive(Debug, Clone)]
pub struct CollectionDescriptor {
    /// Tree path of the collection node.
    path: TreePath,
    /// Pinned schema for records in the collection.
    schema: RecordSchema,
    /// Audit field layout.
    shape: RecordShape,
}

impl CollectionDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub const fn new(path: TreePath, schema: RecordSchema, shape: RecordShape) -> Self {
        Self {
            path,
            schema,
            shape,
        }
    }

    /// Returns a descriptor for the same schema and shape at another path.
    ///
    /// Used by per-parent log collections such as `stages/{batchId}`.
    #[must_use]
    pub fn at(&self, path: TreePath) -> Self {
        Self {
            path,
            schema: self.schema.clone(),
            shape: self.shape,
        }
    }

    /// Returns the collection path.
    #[must_use]
    pub const fn path(&self) -> &TreePath {
        &self.path
    }

    /// Returns the collection name used in errors and logs.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.to_string()
    }

    /// Returns the collection schema.
    #[must_use]
    pub const fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Returns the collection shape.
    #[must_use]
    pub const fn shape(&self) -> RecordShape {
        self.shape
    }

    /// Validates a value against the collection schema.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `value` is not an object or fails the
    /// schema.
    pub fn validate(&self, value: &Value) -> Result<Record, ValidationError> {
        let Some(record) = value.as_object() else {
            return Err(ValidationError::single(
                self.name(),
                ValidationIssue {
                    path: String::new(),
                    message: "record must be a JSON object".to_string(),
                },
            ));
        };
        let issues = self.schema.issues(value);
        if issues.is_empty() {
            Ok(record.clone())
        } else {
            Err(ValidationError {
                collection: self.name(),
                issues,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use serde_json::json;

    use super::*;

    fn descriptor() -> CollectionDescriptor {
        let schema = RecordSchema::compile(json!({
            "type": "object",
            "required": ["name", "volume"],
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "volume": {"type": "number", "exclusiveMinimum": 0}
            }
        }))
        .unwrap();
        CollectionDescriptor::new(TreePath::parse("batches").unwrap(), schema, RecordShape::Flat)
    }

    #[test]
    fn validate_reports_failing_paths() {
        let err = descriptor().validate(&json!({"name": "", "volume": 2})).unwrap_err();
        assert_eq!(err.collection, "batches");
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, "/name");
    }

    #[test]
    fn validate_rejects_non_objects() {
        let err = descriptor().validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.issues[0].path, "");
        assert!(err.to_string().starts_with("batches record failed validation"));
    }

    #[test]
    fn compile_rejects_broken_schema() {
        assert!(RecordSchema::compile(json!({"type": 12})).is_err());
    }
}
