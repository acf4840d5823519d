use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

use crate::db::{ConnectionParams, Driver, RawOutput};
use crate::error::{Result, SqdashError};
use crate::types::{ColumnInfo, KeyRole, Value};

/// Bundled SQLite backend. `database` is a file path, or `:memory:`
/// for an in-memory session.
pub struct SqliteDriver {
    conn: Option<Connection>,
}

impl SqliteDriver {
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        let path = params.database.as_str();
        if path != ":memory:" && !Path::new(path).exists() {
            return Err(SqdashError::connection(format!(
                "database file not found: {path}"
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| SqdashError::connection(e.to_string()))?;

        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| SqdashError::connection(e.to_string()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| SqdashError::connection(e.to_string()))?;

        Ok(Self { conn: Some(conn) })
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| SqdashError::connection("connection is closed"))
    }
}

impl Driver for SqliteDriver {
    fn run(&mut self, sql: &str) -> Result<RawOutput> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SqdashError::execution(e.to_string()))?;

        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mapped = stmt
            .query_map([], |row| {
                let count = row.as_ref().column_count();
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    let value: rusqlite::types::Value = row.get(i)?;
                    values.push(Value::from(value));
                }
                Ok(values)
            })
            .map_err(|e| SqdashError::execution(e.to_string()))?;

        let mut rows = Vec::new();
        for row in mapped {
            rows.push(row.map_err(|e| SqdashError::execution(e.to_string()))?);
        }

        Ok(RawOutput { columns, rows })
    }

    fn tables(&mut self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )
            .map_err(|e| SqdashError::describe(e.to_string()))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| SqdashError::describe(e.to_string()))?;

        let mut tables = Vec::new();
        for name in names {
            tables.push(name.map_err(|e| SqdashError::describe(e.to_string()))?);
        }
        Ok(tables)
    }

    fn describe(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        let conn = self.conn()?;
        let quoted = quote_identifier(table);

        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({quoted})"))
            .map_err(|e| SqdashError::describe(e.to_string()))?;
        let mapped = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let data_type: String = row.get(2)?;
                let pk: bool = row.get(5)?;
                Ok(ColumnInfo {
                    name,
                    data_type,
                    key: if pk { KeyRole::Primary } else { KeyRole::None },
                })
            })
            .map_err(|e| SqdashError::describe(e.to_string()))?;

        let mut columns = Vec::new();
        for column in mapped {
            columns.push(column.map_err(|e| SqdashError::describe(e.to_string()))?);
        }

        // PRAGMA table_info yields nothing for unknown tables instead of
        // failing, so surface the backend's usual message ourselves.
        if columns.is_empty() {
            return Err(SqdashError::describe(format!("no such table: {table}")));
        }

        for name in indexed_columns(conn, &quoted)? {
            if let Some(column) = columns.iter_mut().find(|c| c.name == name) {
                if column.key == KeyRole::None {
                    column.key = KeyRole::Indexed;
                }
            }
        }

        Ok(columns)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| SqdashError::connection(e.to_string()))?;
        }
        Ok(())
    }
}

/// Columns that carry an index marker: referencing columns of foreign
/// keys, plus any column covered by a single-column index.
fn indexed_columns(conn: &Connection, quoted_table: &str) -> Result<Vec<String>> {
    let mut names = Vec::new();

    let mut stmt = conn
        .prepare(&format!("PRAGMA foreign_key_list({quoted_table})"))
        .map_err(|e| SqdashError::describe(e.to_string()))?;
    let froms = stmt
        .query_map([], |row| row.get::<_, String>(3))
        .map_err(|e| SqdashError::describe(e.to_string()))?;
    for from in froms {
        names.push(from.map_err(|e| SqdashError::describe(e.to_string()))?);
    }

    let mut stmt = conn
        .prepare(&format!("PRAGMA index_list({quoted_table})"))
        .map_err(|e| SqdashError::describe(e.to_string()))?;
    let indexes = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| SqdashError::describe(e.to_string()))?;
    let indexes: Vec<String> = indexes
        .collect::<rusqlite::Result<_>>()
        .map_err(|e| SqdashError::describe(e.to_string()))?;

    for index in indexes {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_info({})", quote_identifier(&index)))
            .map_err(|e| SqdashError::describe(e.to_string()))?;
        let cols = stmt
            .query_map([], |row| row.get::<_, String>(2))
            .map_err(|e| SqdashError::describe(e.to_string()))?;
        let cols: Vec<String> = cols
            .collect::<rusqlite::Result<_>>()
            .map_err(|e| SqdashError::describe(e.to_string()))?;
        if cols.len() == 1 {
            names.push(cols[0].clone());
        }
    }

    Ok(names)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
