use std::path::Path;
use tracing::debug;

use crate::db::{self, Handle};
use crate::error::{Result, SqdashError};
use crate::export;
use crate::types::{QuerySpec, ResultSet};

/// Result of the most recent execution, together with the export gate.
///
/// A submission takes the prior state out before the statement runs, so
/// a stale result can never be exported mid-flight. On success the new
/// result is committed and export eligibility follows whether it has
/// rows; on failure the prior state is restored untouched.
#[derive(Debug, Default)]
pub struct SessionState {
    result: Option<ResultSet>,
    exportable: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last committed result, if any.
    #[allow(dead_code)]
    pub fn result(&self) -> Option<&ResultSet> {
        self.result.as_ref()
    }

    /// Run a free-form statement through the session.
    pub fn submit(&mut self, handle: &mut Handle, sql: &str) -> Result<&ResultSet> {
        let prior = self.take();
        match db::execute(handle, sql) {
            Ok(result) => Ok(self.commit(result)),
            Err(e) => {
                self.restore(prior);
                Err(e)
            }
        }
    }

    /// Build and run the statement a [`QuerySpec`] describes.
    pub fn submit_spec(&mut self, handle: &mut Handle, spec: &QuerySpec) -> Result<&ResultSet> {
        let prior = self.take();
        match db::execute_spec(handle, spec) {
            Ok(result) => Ok(self.commit(result)),
            Err(e) => {
                self.restore(prior);
                Err(e)
            }
        }
    }

    /// Drop the held result and export eligibility.
    pub fn clear(&mut self) {
        self.result = None;
        self.exportable = false;
    }

    /// Write the held result to a CSV file. Without an exportable
    /// result this fails as a validation the caller shows as a warning.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        match self.result.as_ref() {
            Some(result) if self.exportable => export::write_csv(result, path),
            _ => Err(SqdashError::validation("no results to export")),
        }
    }

    fn take(&mut self) -> (Option<ResultSet>, bool) {
        let prior = (self.result.take(), self.exportable);
        self.exportable = false;
        prior
    }

    fn commit(&mut self, result: ResultSet) -> &ResultSet {
        self.exportable = !result.is_empty();
        debug!(
            rows = result.rows.len(),
            exportable = self.exportable,
            "result committed"
        );
        self.result.insert(result)
    }

    fn restore(&mut self, prior: (Option<ResultSet>, bool)) {
        self.result = prior.0;
        self.exportable = prior.1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConnectionParams;
    use crate::types::Value;
    use tempfile::tempdir;

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
            "INSERT INTO fruit (name) VALUES ('apple'), ('pear')",
        )
        .unwrap();
        handle
    }

    #[test]
    fn test_submit_commits_and_enables_export() {
        let mut handle = seeded_handle();
        let mut session = SessionState::new();
        session.submit(&mut handle, "SELECT * FROM fruit").unwrap();
        assert_eq!(session.result().unwrap().rows.len(), 2);

        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        session.export_csv(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_success_disables_export() {
        let mut handle = seeded_handle();
        let mut session = SessionState::new();
        session.submit(&mut handle, "SELECT * FROM fruit").unwrap();
        session
            .submit(&mut handle, "SELECT * FROM fruit WHERE id > 99")
            .unwrap();

        assert!(session.result().unwrap().is_empty());
        let dir = tempdir().unwrap();
        let err = session.export_csv(&dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, SqdashError::Validation(_)));
        assert!(err.to_string().contains("no results to export"));
    }

    #[test]
    fn test_failed_submit_restores_prior_state() {
        let mut handle = seeded_handle();
        let mut session = SessionState::new();
        session
            .submit(&mut handle, "SELECT name FROM fruit ORDER BY id")
            .unwrap();

        assert!(session.submit(&mut handle, "SELEC nope").is_err());

        let kept = session.result().unwrap();
        assert_eq!(kept.rows.len(), 2);
        assert_eq!(kept.rows[0][0], Value::Text("apple".to_string()));

        let dir = tempdir().unwrap();
        session.export_csv(&dir.path().join("out.csv")).unwrap();
    }

    #[test]
    fn test_clear_drops_result_and_gate() {
        let mut handle = seeded_handle();
        let mut session = SessionState::new();
        session.submit(&mut handle, "SELECT * FROM fruit").unwrap();
        session.clear();

        assert!(session.result().is_none());
        let dir = tempdir().unwrap();
        let err = session.export_csv(&dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, SqdashError::Validation(_)));
    }

    #[test]
    fn test_export_before_any_submit_is_rejected() {
        let session = SessionState::new();
        let dir = tempdir().unwrap();
        let err = session.export_csv(&dir.path().join("out.csv")).unwrap_err();
        assert!(err.to_string().contains("no results to export"));
    }
}
