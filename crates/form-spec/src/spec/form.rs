use std::collections::BTreeSet;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::spec::field::{DEFAULT_MAX_RATING, Field, FieldPatch, FieldType};

/// Placeholder shown in freshly added phone fields.
pub const DEFAULT_PHONE_PLACEHOLDER: &str = "+7 (000) 000-00-00";
/// Upload limit, in megabytes, for freshly added file fields.
pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 10.0;

const DEFAULT_CHOICE_OPTIONS: [&str; 3] = ["Option 1", "Option 2", "Option 3"];
const DEFAULT_COUNTRY_OPTIONS: [&str; 5] = ["Russia", "USA", "China", "Germany", "France"];
const DEFAULT_HEADER_LABEL: &str = "Section Header";

/// Top-level form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<Field>,
    /// Unix epoch milliseconds of the last edit.
    #[serde(default)]
    pub updated_at: i64,
}

/// Groups forms on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormFolder {
    pub id: String,
    pub name: String,
}

impl FormFolder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
        }
    }
}

/// Direction used by [`FormSchema::move_fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Generates an opaque identifier for forms, folders and fields.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl FormSchema {
    /// Creates an empty form with a fresh id.
    pub fn new(title: impl Into<String>, folder_id: Option<String>) -> Self {
        Self {
            id: new_id(),
            folder_id,
            title: title.into(),
            description: String::new(),
            fields: Vec::new(),
            updated_at: now_millis(),
        }
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    /// Appends a field of `kind` carrying the builder's per-type defaults and
    /// returns it.
    pub fn add_field(&mut self, kind: FieldType, label: impl Into<String>) -> &Field {
        let label = if kind == FieldType::Header {
            DEFAULT_HEADER_LABEL.to_string()
        } else {
            label.into()
        };
        let mut field = Field::new(new_id(), kind, label);
        field.placeholder = Some(String::new());

        match kind {
            FieldType::Checkbox | FieldType::Radio | FieldType::Select | FieldType::Ranking => {
                field.options = Some(to_strings(&DEFAULT_CHOICE_OPTIONS));
            }
            FieldType::Country => {
                field.options = Some(to_strings(&DEFAULT_COUNTRY_OPTIONS));
            }
            FieldType::Rating => field.max_rating = Some(DEFAULT_MAX_RATING),
            FieldType::File => {
                field.max_file_size = Some(DEFAULT_MAX_FILE_SIZE_MB);
                field.accepted_file_types = Some(Vec::new());
            }
            FieldType::Text => field.multiline = Some(true),
            FieldType::Phone => field.placeholder = Some(DEFAULT_PHONE_PLACEHOLDER.to_string()),
            _ => {}
        }

        self.fields.push(field);
        self.touch();
        let last = self.fields.len() - 1;
        &self.fields[last]
    }

    /// Applies `patch` to the field with `id`. Returns `false` when no such
    /// field exists.
    pub fn update_field(&mut self, id: &str, patch: FieldPatch) -> bool {
        let Some(field) = self.fields.iter_mut().find(|field| field.id == id) else {
            return false;
        };
        patch.apply(field);
        self.touch();
        true
    }

    /// Removes the field with `id`, returning it if present.
    pub fn delete_field(&mut self, id: &str) -> Option<Field> {
        let position = self.fields.iter().position(|field| field.id == id)?;
        let removed = self.fields.remove(position);
        self.touch();
        Some(removed)
    }

    /// Removes every field whose id is in `ids` and returns how many went.
    pub fn delete_fields<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let selected: BTreeSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        let before = self.fields.len();
        self.fields
            .retain(|field| !selected.contains(field.id.as_str()));
        let removed = before - self.fields.len();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Moves the selected fields one slot up or down. A selected field only
    /// swaps with an unselected neighbour, so contiguous selections move as a
    /// block and a block already at the edge stays put.
    pub fn move_fields<S: AsRef<str>>(&mut self, ids: &[S], direction: Direction) {
        if ids.is_empty() || self.fields.len() < 2 {
            return;
        }
        let selected: BTreeSet<&str> = ids.iter().map(AsRef::as_ref).collect();
        let is_selected = |field: &Field| selected.contains(field.id.as_str());

        match direction {
            Direction::Up => {
                for index in 1..self.fields.len() {
                    if is_selected(&self.fields[index]) && !is_selected(&self.fields[index - 1]) {
                        self.fields.swap(index, index - 1);
                    }
                }
            }
            Direction::Down => {
                for index in (0..self.fields.len() - 1).rev() {
                    if is_selected(&self.fields[index]) && !is_selected(&self.fields[index + 1]) {
                        self.fields.swap(index, index + 1);
                    }
                }
            }
        }
        self.touch();
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
