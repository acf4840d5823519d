use std::time::Instant;
use tracing::debug;

use crate::db::{builder, schema, Handle};
use crate::error::{Result, SqdashError};
use crate::types::{QuerySpec, ResultSet};

/// Execute one statement and normalize the outcome into a [`ResultSet`].
///
/// Zero rows is an ordinary success. When the backend reports no column
/// metadata for a row-producing statement, positional names
/// (`Column 1`, `Column 2`, ...) are synthesized instead.
pub fn execute(handle: &mut Handle, sql: &str) -> Result<ResultSet> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(SqdashError::validation("query is empty"));
    }

    let start = Instant::now();
    let raw = handle.driver()?.run(sql)?;
    let exec_ms = start.elapsed().as_millis() as u64;

    let columns = if raw.columns.is_empty() && !raw.rows.is_empty() {
        (1..=raw.rows[0].len())
            .map(|i| format!("Column {i}"))
            .collect()
    } else {
        raw.columns
    };

    debug!(rows = raw.rows.len(), exec_ms, "statement finished");

    Ok(ResultSet {
        columns,
        rows: raw.rows,
        exec_ms,
    })
}

/// Build and execute the statement a [`QuerySpec`] describes.
///
/// When no columns were listed, the headers come from the table's
/// declared columns, the same ones a `.schema` listing shows. Execution
/// errors are surfaced before any introspection runs, so a missing
/// table reads as an execution failure here, not a describe failure.
pub fn execute_spec(handle: &mut Handle, spec: &QuerySpec) -> Result<ResultSet> {
    let sql = builder::build_select(spec)?;
    let mut result = execute(handle, &sql)?;

    if spec.columns.trim().is_empty() {
        let headers = schema::list_columns(handle, spec.table.trim())?;
        if headers.len() == result.columns.len() {
            result.columns = headers;
        }
    }

    Ok(result)
}
