//! Non-interactive form scaffolding for `formcraft new`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use form_spec::{FieldType, FormSchema, export_file_name, export_schema};

/// `type` or `type:Label` as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpecArg {
    pub kind: FieldType,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpecError(String);

impl fmt::Display for FieldSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown field type '{}' (expected one of: {})",
            self.0,
            FieldType::ALL
                .iter()
                .map(|kind| kind.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for FieldSpecError {}

impl FromStr for FieldSpecArg {
    type Err = FieldSpecError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (tag, label) = match raw.split_once(':') {
            Some((tag, label)) => (tag, Some(label.trim().to_string())),
            None => (raw, None),
        };
        let tag = tag.trim().to_lowercase();
        let kind = FieldType::parse(&tag).ok_or(FieldSpecError(tag))?;
        Ok(Self {
            kind,
            label: label.filter(|label| !label.is_empty()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewFormInput {
    pub title: String,
    pub description: Option<String>,
    pub folder_id: Option<String>,
    pub fields: Vec<FieldSpecArg>,
}

/// Builds a schema whose fields carry the per-type defaults of the builder.
pub fn build_schema(input: &NewFormInput) -> FormSchema {
    let mut schema = FormSchema::new(input.title.clone(), input.folder_id.clone());
    if let Some(description) = &input.description {
        schema.description = description.clone();
    }
    for spec in &input.fields {
        let label = spec
            .label
            .clone()
            .unwrap_or_else(|| default_label(spec.kind));
        schema.add_field(spec.kind, label);
    }
    schema
}

fn default_label(kind: FieldType) -> String {
    let tag = kind.as_str();
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Writes `schema` under `out_root` using its export file name.
pub fn write_schema(schema: &FormSchema, out_root: &Path, force: bool) -> io::Result<PathBuf> {
    fs::create_dir_all(out_root)?;
    let path = out_root.join(export_file_name(&schema.title));
    if path.exists() && !force {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        ));
    }
    let json = export_schema(schema).map_err(io::Error::other)?;
    fs::write(&path, json)?;
    Ok(path)
}
