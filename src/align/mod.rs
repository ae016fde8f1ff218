//! Alignment of independently sourced series onto the weekly calendar.
//!
//! Each configured column resolves one value per calendar date from its input
//! series using the column's `AlignStrategy` and day offset. Inputs that are
//! absent produce an entirely missing column; partial inputs are the normal
//! case because upstream fetches are unreliable.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{AlignedTable, Column, Provenance, SeriesSpec, TimeSeries};

pub mod liquidity;

pub use liquidity::{NetLiquiditySpec, derive_net_liquidity};

/// Align `series` onto `calendar`, producing one column per spec, in spec order.
///
/// Series are matched to specs by name. A spec without a matching series
/// yields a column with every cell missing.
pub fn align_series(calendar: &[NaiveDate], series: &[TimeSeries], specs: &[SeriesSpec]) -> AlignedTable {
    let by_name: HashMap<&str, &TimeSeries> = series.iter().map(|s| (s.name(), s)).collect();

    let columns = specs
        .iter()
        .map(|spec| {
            let values = match by_name.get(spec.name.as_str()) {
                Some(input) => calendar
                    .iter()
                    .map(|date| input.resolve(*date, spec.strategy, spec.day_offset))
                    .collect(),
                None => {
                    tracing::debug!(column = %spec.name, "no input series; column is entirely missing");
                    vec![None; calendar.len()]
                }
            };
            Column {
                name: spec.name.clone(),
                values,
                provenance: Provenance::Aligned {
                    strategy: spec.strategy,
                    day_offset: spec.day_offset,
                },
            }
        })
        .collect();

    AlignedTable::new(calendar.to_vec(), columns)
}
