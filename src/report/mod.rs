//! Reporting: correlation summary, divergence weeks, terminal formatting.

use chrono::NaiveDate;

use crate::domain::IndexedTable;

pub mod correlation;
pub mod format;

pub use correlation::{CorrelationMatrix, correlation_matrix, pearson_pairwise};
pub use format::*;

/// Strongest correlation of one anchor column.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorCorrelation {
    pub anchor: String,
    pub column: String,
    /// Signed Pearson coefficient.
    pub r: f64,
}

/// Weeks where `falling` dropped while `rising` rose.
#[derive(Debug, Clone, PartialEq)]
pub struct Divergence {
    pub falling: String,
    pub rising: String,
    pub weeks: Vec<NaiveDate>,
}

/// Dates where `falling` dropped versus the previous row while `rising` rose.
///
/// Both rows must have values in both columns. Empty when either column is
/// not in the table.
pub fn divergence_weeks(table: &IndexedTable, falling: &str, rising: &str) -> Vec<NaiveDate> {
    let (Some(down), Some(up)) = (table.column(falling), table.column(rising)) else {
        return Vec::new();
    };

    let dates = table.dates();
    (1..dates.len())
        .filter(|&i| {
            match (down.values[i - 1], down.values[i], up.values[i - 1], up.values[i]) {
                (Some(d0), Some(d1), Some(u0), Some(u1)) => d1 < d0 && u1 > u0,
                _ => false,
            }
        })
        .map(|i| dates[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndexedColumn;
    use chrono::Duration;

    #[test]
    fn flags_liquidity_down_price_up_weeks() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let dates: Vec<_> = (0..5).map(|i| start + Duration::days(7 * i)).collect();
        let col = |name: &str, values: Vec<Option<f64>>| IndexedColumn {
            name: name.to_string(),
            base: 1.0,
            base_date: start,
            values,
        };
        let table = IndexedTable::new(
            dates.clone(),
            vec![
                col("Net Liquidity", vec![Some(100.0), Some(95.0), Some(90.0), None, Some(80.0)]),
                col("BTC Close", vec![Some(100.0), Some(110.0), Some(105.0), Some(120.0), Some(130.0)]),
            ],
        );

        assert_eq!(divergence_weeks(&table, "Net Liquidity", "BTC Close"), vec![dates[1]]);
        assert!(divergence_weeks(&table, "Net Liquidity", "SPX").is_empty());
    }
}
