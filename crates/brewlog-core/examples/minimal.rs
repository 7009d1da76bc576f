// crates/brewlog-core/examples/minimal.rs
// ============================================================================
// Module: Brewlog Minimal Example
// Description: Minimal owner-scoped CRUD over the in-memory tree store.
// Purpose: Demonstrate create/get/update/find with two callers.
// Dependencies: brewlog-core
// ============================================================================

//! ## Overview
//! Pins a small flat schema, writes one record as its owner, and checks that
//! a second caller sees nothing while a privileged caller sees everything.

use brewlog_core::Caller;
use brewlog_core::CollectionDescriptor;
use brewlog_core::OwnerId;
use brewlog_core::Record;
use brewlog_core::RecordSchema;
use brewlog_core::RecordShape;
use brewlog_core::StoreContext;
use brewlog_core::TreePath;
use serde_json::json;

/// Error type for example preconditions.
#[derive(Debug)]
struct ExampleError(&'static str);

impl std::fmt::Display for ExampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ExampleError {}

/// Builds the descriptor of a flat `notes` collection.
fn notes_descriptor() -> Result<CollectionDescriptor, Box<dyn std::error::Error>> {
    let schema = RecordSchema::compile(json!({
        "type": "object",
        "required": ["id", "title", "createdBy", "createdAt", "updatedAt"],
        "properties": {
            "id": {"type": "string"},
            "title": {"type": "string", "minLength": 1},
            "body": {"type": ["string", "null"]},
            "createdBy": {"type": "string"},
            "createdAt": {"type": "integer"},
            "updatedAt": {"type": "integer"}
        },
        "additionalProperties": false
    }))?;
    Ok(CollectionDescriptor::new(TreePath::parse("notes")?, schema, RecordShape::Flat))
}

/// Converts a JSON object literal into a record.
fn record(value: serde_json::Value) -> Result<Record, ExampleError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(ExampleError("record literal must be an object")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let context = StoreContext::in_memory();
    let notes = context.record_store(notes_descriptor()?);
    let alice = Caller::owner(OwnerId::new("alice")?);
    let bob = Caller::owner(OwnerId::new("bob")?);
    let root = Caller::privileged(OwnerId::new("root")?);

    let created = notes.create(record(json!({"title": "first brew"}))?, &alice).await?;
    let id = created
        .get("id")
        .and_then(serde_json::Value::as_str)
        .ok_or(ExampleError("created record has no id"))?;
    let id = brewlog_core::RecordId::new(id)?;

    if notes.get(&id, &bob).await?.is_some() {
        return Err(ExampleError("records must be invisible to other owners").into());
    }
    notes.update(&id, record(json!({"body": "sweet tea, scoby"}))?, &alice).await?;
    let everything = notes.find(&root, |_| true).await?;
    if everything.len() != 1 {
        return Err(ExampleError("privileged callers see every record").into());
    }
    Ok(())
}
