use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::error::{Result, SqdashError};
use crate::types::ResultSet;

/// Write a result set to a CSV file: one header record with the column
/// names, then one record per row. An existing file is overwritten.
pub fn write_csv(result: &ResultSet, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        SqdashError::export(format!("failed to create {}: {}", path.display(), e))
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(&result.columns)
        .map_err(|e| SqdashError::export(e.to_string()))?;

    for row in &result.rows {
        let record: Vec<String> = row.iter().map(|value| value.to_text()).collect();
        writer
            .write_record(&record)
            .map_err(|e| SqdashError::export(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| SqdashError::export(e.to_string()))?;

    info!(path = %path.display(), rows = result.rows.len(), "result set exported");
    Ok(())
}
