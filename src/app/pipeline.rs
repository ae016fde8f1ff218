//! Shared pipeline logic.
//!
//! workbook -> series -> calendar -> alignment -> net liquidity -> indexing ->
//! correlation / divergence
//!
//! Every step takes its inputs by reference and returns new values; nothing
//! computed earlier is modified by a later step.

use std::path::Path;

use chrono::NaiveDate;

use crate::align::{align_series, derive_net_liquidity};
use crate::calendar::weekly_calendar;
use crate::config::PipelineConfig;
use crate::domain::{AlignedTable, IndexedTable, TimeSeries};
use crate::error::{AppError, PipelineError, Stage};
use crate::io::ingest::{IngestedData, RowError, ingest_workbook};
use crate::io::workbook::{Workbook, read_workbook_dir};
use crate::normalize::index_table;
use crate::report::{AnchorCorrelation, CorrelationMatrix, Divergence, correlation_matrix, divergence_weeks};

/// All computed outputs of one `liq run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub sections_found: Vec<String>,
    pub row_errors: Vec<RowError>,
    pub calendar: Vec<NaiveDate>,
    pub aligned: AlignedTable,
    pub indexed: IndexedTable,
    pub correlation: CorrelationMatrix,
    /// Strongest correlation per configured anchor that has one.
    pub strongest: Vec<AnchorCorrelation>,
    pub divergences: Vec<Divergence>,
    /// Local problems, in the order they were found.
    pub diagnostics: Vec<PipelineError>,
}

/// Load the workbook at `dir` and run the pipeline up to `today`.
pub fn run_from_dir(config: &PipelineConfig, dir: &Path, today: NaiveDate) -> Result<RunOutput, AppError> {
    let workbook = read_workbook_dir(dir)?;
    run_with_workbook(config, &workbook, today)
}

pub fn run_with_workbook(config: &PipelineConfig, workbook: &Workbook, today: NaiveDate) -> Result<RunOutput, AppError> {
    let IngestedData {
        series,
        sections_found,
        diagnostics,
        row_errors,
    } = ingest_workbook(workbook, &config.series)?;

    for err in &row_errors {
        tracing::warn!(section = %err.section, line = err.line, "{}", err.message);
    }
    tracing::info!(sections = sections_found.len(), series = series.len(), "workbook ingested");

    let mut output = run_with_series(config, &series, today);
    output.sections_found = sections_found;
    output.row_errors = row_errors;
    let mut all = diagnostics;
    all.append(&mut output.diagnostics);
    output.diagnostics = all;
    Ok(output)
}

/// Pipeline core over already materialized series.
pub fn run_with_series(config: &PipelineConfig, series: &[TimeSeries], today: NaiveDate) -> RunOutput {
    let calendar = weekly_calendar(config.start_date, config.end_or(today), config.weekday);
    tracing::info!(
        start = %config.start_date,
        end = %config.end_or(today),
        weekday = %config.weekday,
        rows = calendar.len(),
        "calendar built"
    );

    let mut diagnostics = Vec::new();

    let mut aligned = align_series(&calendar, series, &config.series);
    if let Some(nl) = &config.net_liquidity {
        aligned = derive_net_liquidity(&aligned, nl);
    }
    for col in aligned.columns() {
        if col.non_missing() == 0 {
            tracing::warn!(column = %col.name, "column has no values after alignment");
            diagnostics.push(PipelineError::NoData {
                column: col.name.clone(),
                stage: Stage::Align,
            });
        }
    }

    let indexing = index_table(&aligned, &config.index_columns);
    // Columns already reported empty at alignment are not reported twice.
    diagnostics.extend(indexing.errors.into_iter().filter(|err| {
        !matches!(err, PipelineError::NoData { column, .. } if aligned.column(column).is_some_and(|c| c.non_missing() == 0))
    }));
    let indexed = indexing.table;

    let correlation = correlation_matrix(&indexed, &[]);
    let mut strongest = Vec::new();
    for anchor in &config.correlation_anchors {
        match correlation.strongest_with(anchor) {
            Some((column, r)) => strongest.push(AnchorCorrelation {
                anchor: anchor.clone(),
                column,
                r,
            }),
            None => {
                tracing::warn!(anchor = %anchor, "no correlation available for anchor");
                diagnostics.push(PipelineError::NoData {
                    column: anchor.clone(),
                    stage: Stage::Correlate,
                });
            }
        }
    }

    let divergences = config
        .divergences
        .iter()
        .map(|pair| Divergence {
            falling: pair.falling.clone(),
            rising: pair.rising.clone(),
            weeks: divergence_weeks(&indexed, &pair.falling, &pair.rising),
        })
        .collect();

    RunOutput {
        sections_found: Vec::new(),
        row_errors: Vec::new(),
        calendar,
        aligned,
        indexed,
        correlation,
        strongest,
        divergences,
        diagnostics,
    }
}
