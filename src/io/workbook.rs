//! Workbook collaborator: a directory of CSV sheets.
//!
//! Each `<Section Name>.csv` in the directory is one named section. This keeps
//! the section layout of the spreadsheet the dashboards were built around
//! while staying plain-text. Reading does no type conversion; that happens in
//! `io::ingest` once column roles have been resolved.

use std::fs;
use std::path::Path;

use crate::error::AppError;

/// One named section: a header row plus string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Section lookup, case-insensitive on the trimmed name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        let wanted = name.trim();
        self.sheets.iter().find(|s| s.name.trim().eq_ignore_ascii_case(wanted))
    }

    /// Add a sheet, replacing any with the same name.
    pub fn insert(&mut self, sheet: Sheet) {
        self.sheets.retain(|s| !s.name.trim().eq_ignore_ascii_case(sheet.name.trim()));
        self.sheets.push(sheet);
    }
}

/// Read every `*.csv` in `dir` as a sheet named after the file stem.
///
/// Sheets are ordered by name so loading is deterministic.
pub fn read_workbook_dir(dir: &Path) -> Result<Workbook, AppError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| AppError::input(format!("Failed to open workbook directory '{}': {e}", dir.display())))?;

    let mut sheets = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::input(format!("Failed to list '{}': {e}", dir.display())))?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !path.is_file() || !is_csv {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        sheets.push(read_sheet(name, &path)?);
    }

    sheets.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(dir = %dir.display(), sheets = sheets.len(), "workbook loaded");
    Ok(Workbook::new(sheets))
}

fn read_sheet(name: &str, path: &Path) -> Result<Sheet, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AppError::input(format!("Failed to open sheet '{}': {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read headers of '{}': {e}", path.display())))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut sheet = Sheet::new(name, headers);
    for (idx, record) in reader.records().enumerate() {
        match record {
            Ok(record) => sheet.rows.push(record.iter().map(str::to_string).collect()),
            // Keep going: a malformed line only loses that row.
            Err(e) => tracing::warn!(sheet = name, line = idx + 2, error = %e, "skipping unreadable CSV row"),
        }
    }
    Ok(sheet)
}

fn normalize_header(name: &str) -> String {
    // Spreadsheet CSV exports often carry a BOM on the first header.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Write each sheet to `<dir>/<name>.csv`, creating `dir` if needed.
pub fn write_workbook_dir(workbook: &Workbook, dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::input(format!("Failed to create workbook directory '{}': {e}", dir.display())))?;

    for sheet in workbook.sheets() {
        let path = dir.join(format!("{}.csv", sheet.name));
        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| AppError::input(format!("Failed to create sheet '{}': {e}", path.display())))?;
        writer
            .write_record(&sheet.headers)
            .map_err(|e| AppError::input(format!("Failed to write headers of '{}': {e}", path.display())))?;
        for row in &sheet.rows {
            writer
                .write_record(row)
                .map_err(|e| AppError::input(format!("Failed to write row of '{}': {e}", path.display())))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::input(format!("Failed to flush '{}': {e}", path.display())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("liq-workbook-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let wb = Workbook::new(vec![Sheet::new("Liquidity Data", vec!["Date".to_string()])]);
        assert!(wb.sheet("liquidity data").is_some());
        assert!(wb.sheet(" LIQUIDITY DATA ").is_some());
        assert!(wb.sheet("Bitcoin").is_none());
    }

    #[test]
    fn directory_layout_survives_write_and_read() {
        let dir = scratch_dir("layout");
        let mut btc = Sheet::new("Bitcoin", vec!["Date".to_string(), "Close".to_string()]);
        btc.rows.push(vec!["2024-01-06".to_string(), "50000".to_string()]);
        btc.rows.push(vec!["2024-01-13".to_string(), String::new()]);
        let mut wb = Workbook::default();
        wb.insert(btc);
        wb.insert(Sheet::new("NASDAQ_SPX", vec!["Date".to_string(), "NASDAQ".to_string()]));

        write_workbook_dir(&wb, &dir).unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let loaded = read_workbook_dir(&dir).unwrap();
        let names: Vec<_> = loaded.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bitcoin", "NASDAQ_SPX"]);
        let sheet = loaded.sheet("bitcoin").unwrap();
        assert_eq!(sheet.cell(0, 1), Some("50000"));
        assert_eq!(sheet.cell(1, 1), Some(""));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn bom_is_stripped_from_headers() {
        let dir = scratch_dir("bom");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Sentiment.csv"), "\u{feff}Date,VIX\n2024-01-05,13.2\n").unwrap();

        let wb = read_workbook_dir(&dir).unwrap();
        assert_eq!(wb.sheet("Sentiment").unwrap().headers, vec!["Date", "VIX"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_input_error() {
        let err = read_workbook_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
