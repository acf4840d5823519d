use crate::error::{Result, SqdashError};
use crate::types::QuerySpec;

/// Assemble a SELECT statement from clause fragments.
///
/// Clauses are appended in a fixed order: WHERE, GROUP BY, HAVING,
/// ORDER BY, LIMIT, OFFSET. Fragments are passed through verbatim;
/// nothing is quoted or escaped. LIMIT and OFFSET must parse as whole
/// numbers and are rejected here, before anything reaches the backend.
pub fn build_select(spec: &QuerySpec) -> Result<String> {
    let table = spec.table.trim();
    if table.is_empty() {
        return Err(SqdashError::validation("table is required"));
    }

    let mut sql = format!("SELECT {} FROM {}", column_list(&spec.columns), table);

    if let Some(clause) = fragment(&spec.where_clause) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
    if let Some(clause) = fragment(&spec.group_by) {
        sql.push_str(" GROUP BY ");
        sql.push_str(clause);
    }
    if let Some(clause) = fragment(&spec.having) {
        sql.push_str(" HAVING ");
        sql.push_str(clause);
    }
    if let Some(clause) = fragment(&spec.order_by) {
        sql.push_str(" ORDER BY ");
        sql.push_str(clause);
    }
    if let Some(raw) = fragment(&spec.limit) {
        sql.push_str(&format!(" LIMIT {}", parse_count(raw, "LIMIT")?));
    }
    if let Some(raw) = fragment(&spec.offset) {
        sql.push_str(&format!(" OFFSET {}", parse_count(raw, "OFFSET")?));
    }

    Ok(sql)
}

fn fragment(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn column_list(raw: &str) -> String {
    match fragment(raw) {
        None => "*".to_string(),
        Some(listed) => listed
            .split(',')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn parse_count(raw: &str, clause: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| SqdashError::validation(format!("{clause} must be a whole number")))
}
