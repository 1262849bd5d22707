use serde_json::Value;

use crate::record::Record;

/// Errors produced while building or merging a JSON document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("existing document does not contain a list of records (top level is {0})")]
    Format(&'static str),

    #[error("no existing document to append to")]
    Missing,

    #[error("failed to serialize document: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Whether converted records start a new document or extend an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    Create,
    Append,
}

/// Serialize records as a pretty-printed JSON array (2-space indentation).
pub fn create_document(records: &[Record]) -> Result<Vec<u8>, DocumentError> {
    serde_json::to_vec_pretty(records).map_err(DocumentError::Serialize)
}

/// Append `records` to the end of an existing serialized document.
///
/// The existing bytes must parse to a JSON array. Elements already in the
/// array are carried over untouched; no de-duplication or schema
/// reconciliation happens.
pub fn append_to_document(existing: &[u8], records: &[Record]) -> Result<Vec<u8>, DocumentError> {
    let parsed: Value = serde_json::from_slice(existing).map_err(DocumentError::Parse)?;

    let mut items = match parsed {
        Value::Array(items) => items,
        other => return Err(DocumentError::Format(json_kind(&other))),
    };

    items.extend(records.iter().cloned().map(Value::Object));

    serde_json::to_vec_pretty(&items).map_err(DocumentError::Serialize)
}

/// Dispatch on an already-decided [`DocumentAction`].
pub fn apply(
    action: DocumentAction,
    existing: Option<&[u8]>,
    records: &[Record],
) -> Result<Vec<u8>, DocumentError> {
    match action {
        DocumentAction::Create => create_document(records),
        DocumentAction::Append => {
            let existing = existing.ok_or(DocumentError::Missing)?;
            append_to_document(existing, records)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
