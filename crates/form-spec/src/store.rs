//! Form and folder bookkeeping over an external key-value store.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::spec::{FormFolder, FormSchema, now_millis};

/// Key holding the JSON array of forms.
pub const FORMS_KEY: &str = "forms";
/// Key holding the JSON array of folders.
pub const FOLDERS_KEY: &str = "folders";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(String),
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value storage supplied by the host (browser local storage, a
/// file, a database row).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-process store, used by tests and headless callers.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// CRUD over forms and folders kept as two JSON arrays.
pub struct FormRepository<S> {
    store: S,
}

impl<S: KeyValueStore> FormRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// All saved forms. Unreadable or corrupt data yields an empty list.
    pub fn forms(&self) -> Vec<FormSchema> {
        self.load(FORMS_KEY)
    }

    /// All saved folders. Unreadable or corrupt data yields an empty list.
    pub fn folders(&self) -> Vec<FormFolder> {
        self.load(FOLDERS_KEY)
    }

    pub fn form(&self, id: &str) -> Option<FormSchema> {
        self.forms().into_iter().find(|form| form.id == id)
    }

    /// Case-insensitive folder name check.
    pub fn folder_exists(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.folders()
            .iter()
            .any(|folder| folder.name.to_lowercase() == name)
    }

    /// Inserts or replaces `form`, stamping `updatedAt`, and returns the
    /// stored copy.
    pub fn save_form(&mut self, form: &FormSchema) -> Result<FormSchema, StoreError> {
        let mut forms = self.forms();
        let mut updated = form.clone();
        updated.updated_at = now_millis();

        match forms.iter_mut().find(|existing| existing.id == updated.id) {
            Some(existing) => *existing = updated.clone(),
            None => forms.push(updated.clone()),
        }
        self.persist(FORMS_KEY, &forms)?;
        Ok(updated)
    }

    pub fn delete_form(&mut self, id: &str) -> Result<(), StoreError> {
        let forms: Vec<FormSchema> = self
            .forms()
            .into_iter()
            .filter(|form| form.id != id)
            .collect();
        self.persist(FORMS_KEY, &forms)
    }

    /// Adds `folder` unless a folder with the same id is already saved.
    pub fn save_folder(&mut self, folder: &FormFolder) -> Result<(), StoreError> {
        let mut folders = self.folders();
        if folders.iter().any(|existing| existing.id == folder.id) {
            return Ok(());
        }
        folders.push(folder.clone());
        self.persist(FOLDERS_KEY, &folders)
    }

    /// Removes a folder; its forms stay but lose their folder link.
    pub fn delete_folder(&mut self, id: &str) -> Result<(), StoreError> {
        let folders: Vec<FormFolder> = self
            .folders()
            .into_iter()
            .filter(|folder| folder.id != id)
            .collect();
        self.persist(FOLDERS_KEY, &folders)?;

        let forms: Vec<FormSchema> = self
            .forms()
            .into_iter()
            .map(|mut form| {
                if form.folder_id.as_deref() == Some(id) {
                    form.folder_id = None;
                }
                form
            })
            .collect();
        self.persist(FORMS_KEY, &forms)
    }

    /// Creates, saves and returns an empty form titled `title`.
    pub fn create_form(
        &mut self,
        title: &str,
        folder_id: Option<String>,
    ) -> Result<FormSchema, StoreError> {
        let form = FormSchema::new(title, folder_id);
        self.save_form(&form)
    }

    pub fn create_folder(&mut self, name: &str) -> Result<FormFolder, StoreError> {
        let folder = FormFolder::new(name);
        self.save_folder(&folder)?;
        Ok(folder)
    }

    fn load<T: DeserializeOwned>(&self, key: &'static str) -> Vec<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key, error = %err, "storage read failed");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(key, error = %err, "stored data is corrupt; ignoring");
            Vec::new()
        })
    }

    fn persist<T: Serialize>(&mut self, key: &'static str, items: &[T]) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_string(items).map_err(|source| StoreError::Encode { key, source })?;
        self.store.set(key, encoded)
    }
}
