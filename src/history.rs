//! Saved-query history.
//!
//! CRUD over a single pretty-printed JSON array of `{"title", "query"}`
//! records, oldest first. Every operation re-reads the file, so the
//! document is the source of truth. A missing or unreadable document
//! loads as an empty history; the next successful write repairs it.
//! Saving and editing validate the query live against the open session
//! and refuse queries that return no rows.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::db::{self, Handle};
use crate::error::{Result, SqdashError};

/// A named, persisted SQL string the user can replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub title: String,
    pub query: String,
}

/// Saved-query log backed by one JSON document.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Stored records, oldest first.
    pub fn list(&self) -> Vec<SavedQuery> {
        load_document(&self.path)
    }

    /// Record at `index`, if present.
    pub fn get(&self, index: usize) -> Option<SavedQuery> {
        self.list().into_iter().nth(index)
    }

    /// Validate the query live and append a record.
    pub fn append(&self, handle: &mut Handle, title: &str, query: &str) -> Result<()> {
        let record = validated(handle, title, query)?;
        let mut history = self.list();
        history.push(record);
        self.persist(&history)
    }

    /// Replace the record at `index`, after the same validation as
    /// [`append`](Self::append). Nothing is written if validation fails
    /// or the index is out of range.
    pub fn update(
        &self,
        handle: &mut Handle,
        index: usize,
        title: &str,
        query: &str,
    ) -> Result<()> {
        let record = validated(handle, title, query)?;
        let mut history = self.list();
        let slot = history
            .get_mut(index)
            .ok_or_else(|| SqdashError::validation(format!("no saved query at index {index}")))?;
        *slot = record;
        self.persist(&history)
    }

    /// Remove the record at `index` and persist. Later records shift
    /// down by one. An out-of-range index is a no-op without a write.
    pub fn delete(&self, index: usize) -> Result<()> {
        let mut history = self.list();
        if index >= history.len() {
            return Ok(());
        }
        history.remove(index);
        self.persist(&history)
    }

    /// Rewrite the whole document atomically: write a sibling temp file
    /// and rename it over the destination.
    fn persist(&self, history: &[SavedQuery]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SqdashError::persistence(format!(
                        "failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(history)
            .map_err(|e| SqdashError::persistence(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| {
            SqdashError::persistence(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            SqdashError::persistence(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!(path = %self.path.display(), records = history.len(), "history written");
        Ok(())
    }
}

/// Shared validation for save and edit: non-empty title, and the query
/// must run against the live session and return at least one row.
fn validated(handle: &mut Handle, title: &str, query: &str) -> Result<SavedQuery> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SqdashError::validation("title is required"));
    }

    let result = db::execute(handle, query)?;
    if result.is_empty() {
        return Err(SqdashError::validation(
            "query returned no rows and was not saved",
        ));
    }

    Ok(SavedQuery {
        title: title.to_string(),
        query: query.trim().to_string(),
    })
}

fn load_document(path: &Path) -> Vec<SavedQuery> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&raw) {
        Ok(history) => history,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "history file is unreadable, treating it as empty"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConnectionParams;
    use tempfile::{tempdir, TempDir};

    fn seeded_handle() -> Handle {
        let params = ConnectionParams {
            database: ":memory:".to_string(),
            ..Default::default()
        };
        let mut handle = Handle::connect(params).unwrap();
        db::execute(
            &mut handle,
            "CREATE TABLE fruit (id INTEGER PRIMARY KEY, name TEXT)",
        )
        .unwrap();
        db::execute(
            &mut handle,
            "INSERT INTO fruit (name) VALUES ('apple'), ('pear'), ('plum')",
        )
        .unwrap();
        handle
    }

    fn store() -> (TempDir, HistoryStore) {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("queries").join("query_history.json"));
        (dir, store)
    }

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        store
            .append(&mut handle, "all", "SELECT * FROM fruit")
            .unwrap();
        store
            .append(&mut handle, "all", "SELECT name FROM fruit")
            .unwrap();

        let history = store.list();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "SELECT * FROM fruit");
        assert_eq!(history[1].query, "SELECT name FROM fruit");
    }

    #[test]
    fn test_append_requires_title() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        let err = store
            .append(&mut handle, "  ", "SELECT * FROM fruit")
            .unwrap_err();
        assert!(matches!(err, SqdashError::Validation(_)));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_append_refuses_zero_row_query() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        let err = store
            .append(&mut handle, "none", "SELECT * FROM fruit WHERE id > 99")
            .unwrap_err();
        assert!(matches!(err, SqdashError::Validation(_)));
        assert!(err.to_string().contains("was not saved"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_append_surfaces_execution_failure() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        let err = store.append(&mut handle, "broken", "SELEC nope").unwrap_err();
        assert!(matches!(err, SqdashError::Execution(_)));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_missing_file_lists_empty() {
        let (_dir, store) = store();
        assert!(store.list().is_empty());
        assert!(store.get(0).is_none());
    }

    #[test]
    fn test_corrupt_file_lists_empty_and_heals_on_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query_history.json");
        fs::write(&path, "{not json at all").unwrap();
        let store = HistoryStore::new(&path);

        assert!(store.list().is_empty());

        let mut handle = seeded_handle();
        store
            .append(&mut handle, "first", "SELECT * FROM fruit")
            .unwrap();
        let history = store.list();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, "first");
    }

    #[test]
    fn test_update_replaces_in_place() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        for title in ["a", "b", "c"] {
            store
                .append(&mut handle, title, "SELECT * FROM fruit")
                .unwrap();
        }

        store
            .update(&mut handle, 1, "b2", "SELECT name FROM fruit")
            .unwrap();

        let history = store.list();
        assert_eq!(history[0].title, "a");
        assert_eq!(history[1].title, "b2");
        assert_eq!(history[1].query, "SELECT name FROM fruit");
        assert_eq!(history[2].title, "c");
    }

    #[test]
    fn test_update_out_of_range_leaves_file_untouched() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        store
            .append(&mut handle, "only", "SELECT * FROM fruit")
            .unwrap();
        let before = fs::read_to_string(store.path.as_path()).unwrap();

        let err = store
            .update(&mut handle, 5, "nope", "SELECT * FROM fruit")
            .unwrap_err();
        assert!(matches!(err, SqdashError::Validation(_)));
        assert_eq!(fs::read_to_string(store.path.as_path()).unwrap(), before);
    }

    #[test]
    fn test_update_failed_validation_keeps_record() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        store
            .append(&mut handle, "keep", "SELECT * FROM fruit")
            .unwrap();

        let err = store
            .update(&mut handle, 0, "keep", "SELECT * FROM fruit WHERE id > 99")
            .unwrap_err();
        assert!(matches!(err, SqdashError::Validation(_)));
        assert_eq!(store.get(0).unwrap().query, "SELECT * FROM fruit");
    }

    #[test]
    fn test_delete_shifts_later_records_down() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        for title in ["a", "b", "c"] {
            store
                .append(&mut handle, title, "SELECT * FROM fruit")
                .unwrap();
        }

        store.delete(1).unwrap();

        let history = store.list();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].title, "a");
        assert_eq!(history[1].title, "c");
    }

    #[test]
    fn test_delete_out_of_range_is_a_noop() {
        let (_dir, store) = store();
        store.delete(3).unwrap();
        assert!(!store.path.exists());

        let mut handle = seeded_handle();
        store
            .append(&mut handle, "only", "SELECT * FROM fruit")
            .unwrap();
        store.delete(7).unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_persist_leaves_no_temp_file() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        store
            .append(&mut handle, "one", "SELECT * FROM fruit")
            .unwrap();
        assert!(store.path.exists());
        assert!(!store.path.with_extension("tmp").exists());
    }

    #[test]
    fn test_document_is_pretty_printed() {
        let (_dir, store) = store();
        let mut handle = seeded_handle();
        store
            .append(&mut handle, "one", "SELECT * FROM fruit")
            .unwrap();
        let raw = fs::read_to_string(store.path.as_path()).unwrap();
        assert!(raw.contains("\n  {"));
        assert!(raw.contains("\"title\": \"one\""));
    }
}
