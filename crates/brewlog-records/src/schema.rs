// crates/brewlog-records/src/schema.rs
// ============================================================================
// Module: Schema Fragments
// Description: Reusable JSON Schema pieces for the pinned collection schemas.
// Purpose: Keep audit, timestamp, and enum conventions identical everywhere.
// Dependencies: brewlog-core, serde_json
// ============================================================================

//! ## Overview
//! Every collection pins one Draft 2020-12 schema built from these fragments.
//! Optional fields accept `null` so an update can clear them; required fields
//! never do. Records reject properties their schema does not name.

use brewlog_core::CollectionDescriptor;
use brewlog_core::RecordSchema;
use brewlog_core::RecordShape;
use brewlog_core::TreePath;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::error::RecordsError;

/// Pattern accepted for email addresses.
pub const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Unix epoch milliseconds.
#[must_use]
pub fn timestamp() -> Value {
    json!({"type": "integer"})
}

/// Non-empty identifier string.
#[must_use]
pub fn uid() -> Value {
    json!({"type": "string", "minLength": 1})
}

/// Any string.
#[must_use]
pub fn text() -> Value {
    json!({"type": "string"})
}

/// Non-empty string.
#[must_use]
pub fn name() -> Value {
    json!({"type": "string", "minLength": 1})
}

/// Any JSON number.
#[must_use]
pub fn number() -> Value {
    json!({"type": "number"})
}

/// Array of strings.
#[must_use]
pub fn strings() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

/// String restricted to `values`.
#[must_use]
pub fn one_of(values: &[&str]) -> Value {
    json!({"type": "string", "enum": values})
}

/// Accepts `schema` or `null`.
#[must_use]
pub fn nullable(schema: Value) -> Value {
    json!({"anyOf": [schema, {"type": "null"}]})
}

/// Closed object schema with `required` keys.
#[must_use]
pub fn object(required: &[&str], properties: Map<String, Value>) -> Value {
    json!({
        "type": "object",
        "required": required,
        "properties": properties,
        "additionalProperties": false
    })
}

/// Builds a property map from `(name, schema)` pairs.
#[must_use]
pub fn properties<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries.into_iter().map(|(key, schema)| (key.to_string(), schema)).collect()
}

/// Adds the flat audit fields (`id`, `createdBy`, `createdAt`, `updatedAt`).
pub fn with_flat_audit(properties: &mut Map<String, Value>) {
    properties.insert("id".to_string(), uid());
    properties.insert("createdBy".to_string(), uid());
    properties.insert("createdAt".to_string(), timestamp());
    properties.insert("updatedAt".to_string(), timestamp());
}

/// Names of the required flat audit fields.
pub const FLAT_AUDIT_REQUIRED: [&str; 4] = ["id", "createdBy", "createdAt", "updatedAt"];

/// Audit keys required inside a nested `metadata` object.
pub const NESTED_AUDIT_REQUIRED: [&str; 3] = ["createdBy", "createdAt", "updatedAt"];

/// Nested `metadata` object shared by equipment and containers.
#[must_use]
pub fn base_metadata(kind: Value) -> Value {
    let props = properties([
        ("name", name()),
        ("description", nullable(text())),
        ("type", kind),
        ("capacity", number()),
        ("createdBy", uid()),
        ("createdAt", timestamp()),
        ("updatedAt", timestamp()),
    ]);
    let mut required = vec!["name", "type", "capacity"];
    required.extend(NESTED_AUDIT_REQUIRED);
    object(&required, props)
}

/// Compiles a collection descriptor for `path`.
///
/// # Errors
///
/// Returns [`RecordsError`] when `path` is not a valid tree path or `schema`
/// does not compile.
pub fn descriptor(
    path: &str,
    schema: Value,
    shape: RecordShape,
) -> Result<CollectionDescriptor, RecordsError> {
    Ok(CollectionDescriptor::new(TreePath::parse(path)?, RecordSchema::compile(schema)?, shape))
}
