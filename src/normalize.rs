//! Base-100 indexing.
//!
//! Each selected column is divided by its first non-missing value (in calendar
//! order) and multiplied by 100. Missing cells stay missing. Columns are
//! indexed independently: a column that cannot be indexed is reported and
//! left out, the others still come through.

use chrono::NaiveDate;

use crate::domain::{AlignedTable, IndexedColumn, IndexedTable};
use crate::error::{PipelineError, Stage};

/// Base (value, row position) of a column: its first non-missing value.
pub fn first_base(values: &[Option<f64>]) -> Option<(usize, f64)> {
    values.iter().enumerate().find_map(|(i, v)| v.map(|v| (i, v)))
}

/// Index one column of values against its own base.
///
/// `dates` is only used to name the base row in errors.
pub fn index_values(
    name: &str,
    dates: &[NaiveDate],
    values: &[Option<f64>],
) -> Result<IndexedColumn, PipelineError> {
    let (pos, base) = first_base(values).ok_or_else(|| PipelineError::NoData {
        column: name.to_string(),
        stage: Stage::Index,
    })?;

    let base_date = dates[pos];
    if base == 0.0 {
        return Err(PipelineError::ZeroBase {
            column: name.to_string(),
            date: base_date,
        });
    }

    let values = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            // The base row is pinned so it is exactly 100 regardless of rounding.
            if i == pos { Some(100.0) } else { v.map(|v| v / base * 100.0) }
        })
        .collect();

    Ok(IndexedColumn {
        name: name.to_string(),
        base,
        base_date,
        values,
    })
}

/// Output of [`index_table`]: the indexed columns plus per-column failures.
#[derive(Debug, Clone, PartialEq)]
pub struct Indexing {
    pub table: IndexedTable,
    pub errors: Vec<PipelineError>,
}

/// Index the requested columns of `table`, in the requested order.
///
/// Columns that are absent or entirely missing produce `NoData`; a zero base
/// produces `ZeroBase`. Neither aborts the remaining columns.
pub fn index_table(table: &AlignedTable, columns: &[String]) -> Indexing {
    let mut indexed = Vec::with_capacity(columns.len());
    let mut errors = Vec::new();

    for name in columns {
        let result = match table.column(name) {
            Some(col) => index_values(name, table.dates(), &col.values),
            None => Err(PipelineError::NoData {
                column: name.clone(),
                stage: Stage::Index,
            }),
        };
        match result {
            Ok(col) => indexed.push(col),
            Err(err) => {
                tracing::warn!(column = %name, error = %err, "column not indexed");
                errors.push(err);
            }
        }
    }

    Indexing {
        table: IndexedTable::new(table.dates().to_vec(), indexed),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlignStrategy, Column, Provenance};
    use chrono::Duration;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        (0..n).map(|i| start + Duration::days(7 * i as i64)).collect()
    }

    fn column(name: &str, values: Vec<Option<f64>>) -> Column {
        Column {
            name: name.to_string(),
            values,
            provenance: Provenance::Aligned {
                strategy: AlignStrategy::Exact,
                day_offset: 0,
            },
        }
    }

    #[test]
    fn first_non_missing_becomes_100() {
        let values = vec![None, Some(3.7), Some(7.4), None, Some(1.85)];
        let col = index_values("x", &dates(5), &values).unwrap();
        assert_eq!(col.values[0], None);
        assert!((col.values[1].unwrap() - 100.0).abs() < 1e-9);
        assert!((col.values[2].unwrap() - 200.0).abs() < 1e-9);
        assert_eq!(col.values[3], None);
        assert!((col.values[4].unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(col.base_date, dates(5)[1]);
    }

    #[test]
    fn zero_base_is_an_error_not_infinity() {
        let err = index_values("flat", &dates(3), &[None, Some(0.0), Some(5.0)]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ZeroBase {
                column: "flat".to_string(),
                date: dates(3)[1],
            }
        );
    }

    #[test]
    fn negative_base_still_indexes() {
        let col = index_values("neg", &dates(2), &[Some(-4.0), Some(-2.0)]).unwrap();
        assert_eq!(col.values, vec![Some(100.0), Some(50.0)]);
    }

    #[test]
    fn reindexing_an_indexed_column_is_identity() {
        let raw = vec![Some(80.0), None, Some(70.0), Some(91.3)];
        let once = index_values("x", &dates(4), &raw).unwrap();
        let twice = index_values("x", &dates(4), &once.values).unwrap();
        assert_eq!(twice.base, 100.0);
        for (a, b) in once.values.iter().zip(&twice.values) {
            match (a, b) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9),
                (None, None) => {}
                _ => panic!("missing pattern changed"),
            }
        }
    }

    #[test]
    fn table_indexing_isolates_failures() {
        let table = AlignedTable::new(
            dates(2),
            vec![
                column("good", vec![Some(2.0), Some(3.0)]),
                column("zero", vec![Some(0.0), Some(1.0)]),
                column("empty", vec![None, None]),
            ],
        );
        let wanted: Vec<String> = ["good", "zero", "empty", "absent"].iter().map(|s| s.to_string()).collect();
        let out = index_table(&table, &wanted);

        assert_eq!(out.table.columns().len(), 1);
        assert_eq!(out.table.column("good").unwrap().values, vec![Some(100.0), Some(150.0)]);
        assert_eq!(out.errors.len(), 3);
        assert!(matches!(out.errors[0], PipelineError::ZeroBase { .. }));
        assert!(matches!(out.errors[1], PipelineError::NoData { .. }));
        assert_eq!(out.errors[2].column(), Some("absent"));
        // Source table keeps its raw values.
        assert_eq!(table.column("good").unwrap().values, vec![Some(2.0), Some(3.0)]);
    }
}
