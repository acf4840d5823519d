use crate::db::Handle;
use crate::error::Result;
use crate::types::ColumnInfo;

/// Names of the user tables, in the backend's listing order.
pub fn list_tables(handle: &mut Handle) -> Result<Vec<String>> {
    handle.driver()?.tables()
}

/// Column metadata for one table.
pub fn describe(handle: &mut Handle, table: &str) -> Result<Vec<ColumnInfo>> {
    handle.driver()?.describe(table)
}

/// Column names only. Used to label results when a query selected all
/// columns and nothing was listed by the user.
pub fn list_columns(handle: &mut Handle, table: &str) -> Result<Vec<String>> {
    Ok(describe(handle, table)?
        .into_iter()
        .map(|column| column.name)
        .collect())
}
