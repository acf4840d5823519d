use rusqlite::types::Value as SqliteValue;

/// A single cell value, normalized away from any backend-specific type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<SqliteValue> for Value {
    fn from(v: SqliteValue) -> Self {
        match v {
            SqliteValue::Null => Value::Null,
            SqliteValue::Integer(i) => Value::Integer(i),
            SqliteValue::Real(r) => Value::Real(r),
            SqliteValue::Text(t) => Value::Text(t),
            SqliteValue::Blob(b) => Value::Blob(b),
        }
    }
}

impl Value {
    /// Textual form shared by the table renderer and the CSV exporter.
    /// Nulls render empty; blobs render as a size placeholder.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(t) => t.clone(),
            Value::Blob(b) => format!("<BLOB {} bytes>", b.len()),
        }
    }
}

/// Tabular outcome of one successful execution.
///
/// Every row holds exactly `columns.len()` values. Zero rows is a valid
/// state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub exec_ms: u64,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Clause fragments for an assembled SELECT statement.
///
/// Each fragment is the raw user string; a field that is empty after
/// trimming is omitted from the statement. Only `table` is required.
/// `columns` is a comma-separated list, empty meaning all columns.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub table: String,
    pub columns: String,
    pub where_clause: String,
    pub group_by: String,
    pub having: String,
    pub order_by: String,
    pub limit: String,
    pub offset: String,
}
