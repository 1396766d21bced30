//! JSON import and export of form schemas.

use serde_json::Value;
use thiserror::Error;

use crate::spec::{Field, FormSchema};

/// Reasons an imported document is rejected. An import either succeeds as a
/// whole or leaves the caller's schema untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("document is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("document has no `fields` array")]
    MissingFields,
    #[error("field #{index} is malformed: {source}")]
    InvalidField {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("schema metadata is malformed: {0}")]
    InvalidSchema(#[source] serde_json::Error),
}

/// Pretty JSON used for file downloads.
pub fn export_schema(schema: &FormSchema) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(schema)
}

/// Download name derived from the title: `"My Quiz"` becomes
/// `"my_quiz_schema.json"`.
pub fn export_file_name(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut name = String::with_capacity(lowered.len());
    let mut in_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(ch);
            in_space = false;
        }
    }
    format!("{name}_schema.json")
}

/// Parses the `fields` array of a document, rejecting the whole document on
/// the first bad entry.
pub fn parse_fields(document: &Value) -> Result<Vec<Field>, ImportError> {
    let items = document
        .get("fields")
        .and_then(Value::as_array)
        .ok_or(ImportError::MissingFields)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item.clone())
                .map_err(|source| ImportError::InvalidField { index, source })
        })
        .collect()
}

/// Imports a complete exported schema.
pub fn import_schema(json: &str) -> Result<FormSchema, ImportError> {
    let document: Value = serde_json::from_str(json).map_err(ImportError::InvalidJson)?;
    parse_fields(&document)?;
    serde_json::from_value(document).map_err(ImportError::InvalidSchema)
}

/// Loads a document into `current`: the id, folder and timestamp stay, the
/// title and description are taken when present and non-empty, and the field
/// list is replaced. `current` is only read; the merged schema is returned.
pub fn merge_import(current: &FormSchema, json: &str) -> Result<FormSchema, ImportError> {
    let document: Value = serde_json::from_str(json).map_err(ImportError::InvalidJson)?;
    let fields = parse_fields(&document)?;
    let text = |key: &str| {
        document
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let mut merged = current.clone();
    merged.title = text("title").unwrap_or_else(|| current.title.clone());
    merged.description = text("description").unwrap_or_else(|| current.description.clone());
    merged.fields = fields;
    merged.touch();
    Ok(merged)
}
