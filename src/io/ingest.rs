//! Workbook ingest.
//!
//! Turns the configured sections of a workbook into named `TimeSeries`, one
//! per `SeriesSpec`. Problems are local:
//! - a missing section disables every series read from it
//! - a missing role column disables that series only (a missing `Date`
//!   column disables the whole section)
//! - an unparsable row is skipped and reported
//!
//! Only when none of the configured sections exist does ingest fail.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{ColumnRole, Observation, SeriesSpec, TimeSeries};
use crate::error::PipelineError;
use crate::io::roles::ColumnMap;
use crate::io::workbook::{Sheet, Workbook};

/// A row-level problem encountered while reading a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub section: String,
    /// 1-based line in the sheet, header included.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestedData {
    /// Series that could be read, in configuration order.
    pub series: Vec<TimeSeries>,
    /// Sections present in the workbook (configured ones only).
    pub sections_found: Vec<String>,
    /// Missing sections / columns.
    pub diagnostics: Vec<PipelineError>,
    pub row_errors: Vec<RowError>,
}

/// Read every configured series from `workbook`.
pub fn ingest_workbook(workbook: &Workbook, specs: &[SeriesSpec]) -> Result<IngestedData, PipelineError> {
    // Sections in first-mention order.
    let mut sections: Vec<&str> = Vec::new();
    for spec in specs {
        if !sections.iter().any(|s| s.eq_ignore_ascii_case(&spec.section)) {
            sections.push(&spec.section);
        }
    }

    let mut series = Vec::new();
    let mut sections_found = Vec::new();
    let mut diagnostics = Vec::new();
    let mut row_errors = Vec::new();

    for section in &sections {
        let Some(sheet) = workbook.sheet(section) else {
            tracing::warn!(section, "section not found; its series will be missing");
            diagnostics.push(PipelineError::MissingSection {
                section: section.to_string(),
            });
            continue;
        };
        sections_found.push(section.to_string());

        let columns = ColumnMap::resolve(&sheet.headers);
        let Some(date_col) = columns.get(ColumnRole::Date) else {
            tracing::warn!(section, "no date column; section skipped");
            diagnostics.push(PipelineError::MissingColumn {
                section: section.to_string(),
                role: ColumnRole::Date,
            });
            continue;
        };

        let dates = parse_dates(sheet, date_col, &mut row_errors);

        let section_specs = specs.iter().filter(|s| s.section.eq_ignore_ascii_case(section));
        let mut reported: BTreeSet<ColumnRole> = BTreeSet::new();
        for spec in section_specs {
            let Some(value_col) = columns.get(spec.role) else {
                if reported.insert(spec.role) {
                    tracing::warn!(section, role = %spec.role, series = %spec.name, "no matching column; series dropped");
                    diagnostics.push(PipelineError::MissingColumn {
                        section: section.to_string(),
                        role: spec.role,
                    });
                }
                continue;
            };

            let mut observations = Vec::with_capacity(dates.len());
            for (row, date) in &dates {
                let Some(date) = *date else { continue };
                let raw = sheet.cell(*row, value_col).unwrap_or("");
                let value = parse_value(raw).unwrap_or_else(|message| {
                    row_errors.push(RowError {
                        section: sheet.name.clone(),
                        line: row + 2,
                        message: format!("{}: {message}", sheet.headers[value_col]),
                    });
                    None
                });
                observations.push(Observation::new(date, value));
            }
            let s = TimeSeries::new(spec.name.clone(), observations);
            tracing::debug!(series = %spec.name, section, observations = s.len(), "series ingested");
            series.push(s);
        }
    }

    if sections_found.is_empty() {
        return Err(PipelineError::NoInputs {
            expected: sections.join(", "),
        });
    }

    Ok(IngestedData {
        series,
        sections_found,
        diagnostics,
        row_errors,
    })
}

/// Parse the date column once per sheet. Rows whose date fails to parse map
/// to `None` and are reported.
fn parse_dates(sheet: &Sheet, date_col: usize, row_errors: &mut Vec<RowError>) -> Vec<(usize, Option<NaiveDate>)> {
    (0..sheet.rows.len())
        .map(|row| {
            let raw = sheet.cell(row, date_col).unwrap_or("").trim();
            let date = match parse_date(raw) {
                Ok(date) => Some(date),
                Err(message) => {
                    row_errors.push(RowError {
                        section: sheet.name.clone(),
                        line: row + 2,
                        message,
                    });
                    None
                }
            };
            (row, date)
        })
        .collect()
}

/// Accepts ISO dates, a few common day-first forms, and spreadsheet datetime
/// exports (the time part is dropped).
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    const DATETIME_FMTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

    let s = s.trim();
    if s.is_empty() {
        return Err("Missing date.".to_string());
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY or YYYY-MM-DD HH:MM:SS."
    ))
}

/// Numeric cell -> value. Blank, `.` (FRED's missing marker), `NaN` and
/// non-finite numbers are missing.
///
/// Commas are accepted only as thousands separators (`7,123,456.5`); any
/// other comma, like a decimal comma in `1,5`, makes the cell invalid.
pub fn parse_value(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Ok(None);
    }
    let plain = if trimmed.contains(',') {
        strip_thousands(trimmed).ok_or_else(|| format!("Invalid number '{trimmed}' (misplaced comma)."))?
    } else {
        trimmed.to_string()
    };
    let v = plain
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{trimmed}'."))?;
    Ok(if v.is_finite() { Some(v) } else { None })
}

/// `s` without its thousands separators, or `None` when a comma is not one.
fn strip_thousands(s: &str) -> Option<String> {
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };
    if frac_part.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let mut groups = int_part.split(',');
    let head = groups.next()?;
    if head.is_empty() || head.len() > 3 || !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    Some(s.replace(',', ""))
}
