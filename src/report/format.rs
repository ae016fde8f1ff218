//! Terminal formatting for `liq run`.
//!
//! Formatting lives here so the pipeline stays free of presentation and
//! output changes are localized.

use crate::app::pipeline::RunOutput;
use crate::config::PipelineConfig;
use crate::domain::{AlignedTable, IndexedTable, Provenance};
use crate::report::{AnchorCorrelation, CorrelationMatrix, Divergence};

/// Header block: calendar, sections, diagnostics.
pub fn format_run_summary(run: &RunOutput, config: &PipelineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== liq - Liquidity Monitor ===\n");
    match (run.calendar.first(), run.calendar.last()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Calendar: {first} .. {last} ({} weekly rows, every {})\n",
            run.calendar.len(),
            config.weekday
        )),
        _ => out.push_str("Calendar: empty\n"),
    }
    out.push_str(&format!("Sections: {}\n", run.sections_found.join(", ")));

    for col in run.aligned.columns() {
        if let Provenance::Derived { imputed } = &col.provenance {
            let n = imputed.iter().filter(|f| **f).count();
            if n > 0 {
                out.push_str(&format!("{}: {n} row(s) with zero-imputed inputs\n", col.name));
            }
        }
    }

    if !run.row_errors.is_empty() {
        out.push_str(&format!("Skipped rows: {}\n", run.row_errors.len()));
    }

    if !run.diagnostics.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for err in &run.diagnostics {
            out.push_str(&format!("- {err}\n"));
        }
    }
    out.push('\n');
    out
}

/// Last `n` rows of the aligned table.
pub fn format_aligned_tail(table: &AlignedTable, n: usize) -> String {
    let names: Vec<&str> = table.column_names().collect();
    let widths: Vec<usize> = names.iter().map(|name| name.len().max(12)).collect();

    let mut out = String::new();
    out.push_str(&format!("Aligned (last {} of {} rows):\n", n.min(table.len()), table.len()));
    out.push_str(&format!("{:<10}", "Date"));
    for (name, &w) in names.iter().zip(&widths) {
        out.push_str(&format!("  {name:>w$}"));
    }
    out.push('\n');

    let skip = table.len().saturating_sub(n);
    for row in table.rows().skip(skip) {
        out.push_str(&row.date.to_string());
        for ((_, value), &w) in row.values.iter().zip(&widths) {
            out.push_str(&format!("  {:>w$}", fmt_cell(*value)));
        }
        out.push('\n');
    }
    out
}

/// Base and latest value of every indexed column.
pub fn format_indexed(table: &IndexedTable) -> String {
    let mut out = String::new();
    out.push_str("Indexed (100 = first value):\n");
    if table.columns().is_empty() {
        out.push_str("  (no indexable columns)\n");
        return out;
    }
    for col in table.columns() {
        let latest = col
            .values
            .iter()
            .zip(table.dates())
            .rev()
            .find_map(|(v, date)| v.map(|v| (date, v)));
        let latest = latest
            .map(|(date, v)| format!("{v:.2} on {date}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<20} base {:.2} on {}  latest {latest}\n",
            col.label(),
            col.base,
            col.base_date
        ));
    }
    out
}

/// Correlation matrix plus the anchor summaries.
pub fn format_correlation(matrix: &CorrelationMatrix, strongest: &[AnchorCorrelation]) -> String {
    let mut out = String::new();
    if matrix.names.len() < 2 {
        return out;
    }

    out.push_str("Correlation (indexed, pairwise-complete):\n");
    let width = matrix.names.iter().map(|n| n.len()).max().unwrap_or(8).max(8);
    out.push_str(&format!("{:width$}", ""));
    for name in &matrix.names {
        out.push_str(&format!("  {name:>width$}"));
    }
    out.push('\n');
    for (name, row) in matrix.names.iter().zip(&matrix.values) {
        out.push_str(&format!("{name:<width$}"));
        for value in row {
            let cell = value.map(|r| format!("{r:.2}")).unwrap_or_else(|| "-".to_string());
            out.push_str(&format!("  {cell:>width$}"));
        }
        out.push('\n');
    }

    for found in strongest {
        out.push_str(&format!(
            "Strongest correlation with {}: {} ({:.2})\n",
            found.anchor, found.column, found.r
        ));
    }
    out
}

/// One line per divergence pair: week count and the most recent week.
pub fn format_divergences(divergences: &[Divergence]) -> String {
    let mut out = String::new();
    for div in divergences {
        out.push_str(&format!("Weeks with {} down and {} up: {}", div.falling, div.rising, div.weeks.len()));
        if let Some(last) = div.weeks.last() {
            out.push_str(&format!(" (latest {last})"));
        }
        out.push('\n');
    }
    out
}

fn fmt_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1e6 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}
