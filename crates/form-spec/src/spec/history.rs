//! Undo and redo snapshots for a form being edited.

use std::collections::VecDeque;

use crate::spec::form::{FormSchema, now_millis};

/// Oldest snapshots are dropped past this many undo steps.
pub const MAX_HISTORY: usize = 50;
/// Consecutive edits sharing a key inside this window collapse into one step.
pub const HISTORY_MERGE_WINDOW_MS: i64 = 2000;

/// Caller-owned undo/redo stacks of whole-form snapshots.
///
/// Record the form as it was *before* each edit; `undo` and `redo` take the
/// current form and hand back the one to switch to.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    undo: VecDeque<FormSchema>,
    redo: Vec<FormSchema>,
    last_key: Option<String>,
    last_at: i64,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `before` as an undo step and clears the redo stack.
    pub fn record(&mut self, before: &FormSchema) {
        self.record_keyed(before, None, now_millis());
    }

    /// Like [`EditHistory::record`], but an edit with the same `key` as the
    /// previous one within [`HISTORY_MERGE_WINDOW_MS`] of `at` extends that
    /// step instead of adding a new one. Typing into one input is the usual
    /// case.
    pub fn record_keyed(&mut self, before: &FormSchema, key: Option<&str>, at: i64) {
        let merges = key.is_some()
            && key == self.last_key.as_deref()
            && at - self.last_at < HISTORY_MERGE_WINDOW_MS;
        if !merges {
            self.push_undo(before.clone());
        }
        self.redo.clear();
        self.last_key = key.map(str::to_string);
        self.last_at = at;
    }

    /// Steps back: returns the previous snapshot and remembers `current` for
    /// redo. `None` when there is nothing to undo.
    pub fn undo(&mut self, current: &FormSchema) -> Option<FormSchema> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.clone());
        self.break_merge();
        Some(previous)
    }

    /// Reapplies the most recently undone snapshot.
    pub fn redo(&mut self, current: &FormSchema) -> Option<FormSchema> {
        let next = self.redo.pop()?;
        self.push_undo(current.clone());
        self.break_merge();
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Forgets everything, e.g. when another form is opened.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn push_undo(&mut self, snapshot: FormSchema) {
        self.undo.push_back(snapshot);
        if self.undo.len() > MAX_HISTORY {
            self.undo.pop_front();
        }
    }

    fn break_merge(&mut self) {
        self.last_key = None;
        self.last_at = 0;
    }
}
