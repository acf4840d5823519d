//! Connection suggestions.
//!
//! A small recency book of previously used host, user, and database
//! values, persisted as one JSON object with those three keys. Each
//! list is most-recent-first and capped; passwords are never written.
//! A missing or unreadable file loads as an empty book, and the next
//! successful save repairs it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, SqdashError};

/// Values kept per field.
const BOOK_CAP: usize = 5;

/// Recency-ordered connection field values, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBook {
    #[serde(default)]
    pub host: Vec<String>,
    #[serde(default)]
    pub user: Vec<String>,
    #[serde(default)]
    pub database: Vec<String>,
}

impl CredentialBook {
    /// Load the book from `path`; any failure yields an empty book.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(book) => book,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "credential file is unreadable, starting empty"
                );
                Self::default()
            }
        }
    }

    /// Note one successful connection's fields. Each value moves to the
    /// front of its list; re-used values are not duplicated.
    pub fn record(&mut self, host: &str, user: &str, database: &str) {
        push_front(&mut self.host, host);
        push_front(&mut self.user, user);
        push_front(&mut self.database, database);
    }

    /// Write the whole book atomically via a sibling temp file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
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

        let json =
            serde_json::to_string(self).map_err(|e| SqdashError::persistence(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| {
            SqdashError::persistence(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            SqdashError::persistence(format!("failed to replace {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "credential book written");
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_empty() && self.user.is_empty() && self.database.is_empty()
    }
}

fn push_front(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    list.retain(|existing| existing != value);
    list.insert(0, value.to_string());
    list.truncate(BOOK_CAP);
}
