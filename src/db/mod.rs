mod builder;
pub mod query;
mod schema;
mod sqlite;

use tracing::info;

use crate::error::{Result, SqdashError};
use crate::types::{ColumnInfo, Value};

pub use query::{execute, execute_spec};
pub use schema::{describe, list_tables};

/// Connection identity for one session. Opaque to everything above the
/// driver; the bundled SQLite driver only reads `database`.
#[derive(Debug, Clone, Default)]
pub struct ConnectionParams {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// Raw driver output for one statement: column metadata as reported by
/// the backend (possibly empty) plus every row it produced.
pub struct RawOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Capability a database backend provides to the rest of the crate.
pub trait Driver {
    /// Run one statement and fetch all rows it produces.
    fn run(&mut self, sql: &str) -> Result<RawOutput>;

    /// Names of the user tables.
    fn tables(&mut self) -> Result<Vec<String>>;

    /// Column metadata for one table.
    fn describe(&mut self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Release the underlying session.
    fn close(&mut self) -> Result<()>;
}

/// Exclusive owner of one live database session.
///
/// `close` is idempotent; a dropped handle closes itself. Any operation
/// on a closed handle fails with a connection error.
pub struct Handle {
    driver: Option<Box<dyn Driver>>,
}

impl Handle {
    /// Validate the parameters and open a session.
    pub fn connect(params: ConnectionParams) -> Result<Self> {
        if params.database.trim().is_empty() {
            return Err(SqdashError::validation("database is required"));
        }
        let driver = sqlite::SqliteDriver::open(&params)?;
        info!(database = %params.database, "connected");
        Ok(Self {
            driver: Some(Box::new(driver)),
        })
    }

    /// Close the session. Calling this on an already-closed handle is Ok.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut driver) = self.driver.take() {
            driver.close()?;
            info!("disconnected");
        }
        Ok(())
    }

    pub(crate) fn driver(&mut self) -> Result<&mut (dyn Driver + 'static)> {
        self.driver
            .as_deref_mut()
            .ok_or_else(|| SqdashError::connection("connection is closed"))
    }

    #[cfg(test)]
    pub(crate) fn with_driver(driver: Box<dyn Driver>) -> Self {
        Self {
            driver: Some(driver),
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_params() -> ConnectionParams {
        ConnectionParams {
            database: ":memory:".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_connect_requires_database() {
        let err = Handle::connect(ConnectionParams::default()).err().unwrap();
        assert!(matches!(err, SqdashError::Validation(_)));
    }

    #[test]
    fn test_connect_rejects_missing_file() {
        let params = ConnectionParams {
            database: "/no/such/file.db".to_string(),
            ..Default::default()
        };
        let err = Handle::connect(params).err().unwrap();
        assert!(matches!(err, SqdashError::Connection(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_open_handle_lends_a_usable_driver() {
        let mut handle = Handle::connect(memory_params()).unwrap();
        let output = handle.driver().unwrap().run("SELECT 1 AS one").unwrap();
        assert_eq!(output.columns, vec!["one"]);
        assert_eq!(output.rows.len(), 1);
    }

    #[test]
    fn test_close_twice_is_ok() {
        let mut handle = Handle::connect(memory_params()).unwrap();
        handle.close().unwrap();
        handle.close().unwrap();
    }

    #[test]
    fn test_operations_after_close_fail() {
        let mut handle = Handle::connect(memory_params()).unwrap();
        handle.close().unwrap();
        let err = list_tables(&mut handle).unwrap_err();
        assert!(matches!(err, SqdashError::Connection(_)));
        assert!(err.to_string().contains("connection is closed"));
    }
}
