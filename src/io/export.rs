//! Export aligned / indexed tables to CSV.
//!
//! Layout: `Date` first, then one column per series; missing cells are empty.
//! Derived columns also get a `<name> imputed` flag column.

use std::path::Path;

use crate::domain::{AlignedTable, IndexedTable, Provenance};
use crate::error::AppError;

/// Write the aligned table to `path`.
pub fn write_aligned_csv(path: &Path, table: &AlignedTable) -> Result<(), AppError> {
    let mut writer = open(path)?;

    let mut header = vec!["Date".to_string()];
    for col in table.columns() {
        header.push(col.name.clone());
        if matches!(col.provenance, Provenance::Derived { .. }) {
            header.push(format!("{} imputed", col.name));
        }
    }
    write_record(&mut writer, path, &header)?;

    for (i, date) in table.dates().iter().enumerate() {
        let mut record = vec![date.to_string()];
        for col in table.columns() {
            record.push(fmt_cell(col.values[i]));
            if let Provenance::Derived { imputed } = &col.provenance {
                record.push(imputed[i].to_string());
            }
        }
        write_record(&mut writer, path, &record)?;
    }

    finish(writer, path)
}

/// Write the indexed table to `path`. Column headers carry an ` (idx)` suffix.
pub fn write_indexed_csv(path: &Path, table: &IndexedTable) -> Result<(), AppError> {
    let mut writer = open(path)?;

    let mut header = vec!["Date".to_string()];
    header.extend(table.columns().iter().map(|c| c.label()));
    write_record(&mut writer, path, &header)?;

    for (i, date) in table.dates().iter().enumerate() {
        let mut record = vec![date.to_string()];
        record.extend(table.columns().iter().map(|c| fmt_cell(c.values[i])));
        write_record(&mut writer, path, &record)?;
    }

    finish(writer, path)
}

fn fmt_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn open(path: &Path) -> Result<csv::Writer<std::fs::File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_record(writer: &mut csv::Writer<std::fs::File>, path: &Path, record: &[String]) -> Result<(), AppError> {
    writer
        .write_record(record)
        .map_err(|e| AppError::input(format!("Failed to write export CSV '{}': {e}", path.display())))
}

fn finish(mut writer: csv::Writer<std::fs::File>, path: &Path) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV '{}': {e}", path.display())))
}
