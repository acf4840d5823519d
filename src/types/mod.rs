pub mod query;
pub mod table;

pub use query::{QuerySpec, ResultSet, Value};
pub use table::{ColumnInfo, KeyRole};
