//! Net liquidity: balance sheet minus Treasury account minus repo facility.
//!
//! Computed row-wise on an aligned table. A missing input is treated as zero
//! and every row where that happened is flagged in the column's provenance.
//! This holds even when all three inputs are missing on a row: the row is 0
//! and flagged.
//!
//! Zero-imputation also applies when an input column is absent from the table
//! altogether (e.g. the repo series was never provided). The result then means
//! "balance sheet minus whatever was available".
//!
//! When none of the three inputs has a single value but the workbook carried
//! its own net liquidity column (`reported`), that column is used as is.

use serde::{Deserialize, Serialize};

use crate::domain::{AlignedTable, Column, Provenance};

/// Column names feeding the derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetLiquiditySpec {
    pub balance_sheet: String,
    pub treasury_account: String,
    pub repo_facility: String,
    pub output: String,
    /// Aligned column holding an already computed net liquidity.
    #[serde(default)]
    pub reported: Option<String>,
}

impl Default for NetLiquiditySpec {
    fn default() -> Self {
        Self {
            balance_sheet: "Fed BS".to_string(),
            treasury_account: "TGA".to_string(),
            repo_facility: "RRP".to_string(),
            output: "Net Liquidity".to_string(),
            reported: None,
        }
    }
}

/// A new table with the net liquidity column appended.
pub fn derive_net_liquidity(table: &AlignedTable, spec: &NetLiquiditySpec) -> AlignedTable {
    let n = table.len();
    let missing = vec![None; n];

    let bs = input_values(table, &spec.balance_sheet, &missing, &spec.output);
    let tga = input_values(table, &spec.treasury_account, &missing, &spec.output);
    let rrp = input_values(table, &spec.repo_facility, &missing, &spec.output);

    let no_inputs = [bs, tga, rrp].iter().all(|col| col.iter().all(Option::is_none));
    if no_inputs {
        if let Some(reported) = reported_column(table, spec) {
            tracing::info!(output = %spec.output, source = %reported.name, "no net liquidity inputs; using reported column");
            return table.with_column(Column {
                name: spec.output.clone(),
                values: reported.values.clone(),
                provenance: Provenance::Derived { imputed: vec![false; n] },
            });
        }
    }

    let mut values = Vec::with_capacity(n);
    let mut imputed = Vec::with_capacity(n);
    for i in 0..n {
        let (b, t, r) = (bs[i], tga[i], rrp[i]);
        values.push(Some(b.unwrap_or(0.0) - t.unwrap_or(0.0) - r.unwrap_or(0.0)));
        imputed.push(b.is_none() || t.is_none() || r.is_none());
    }

    let imputed_rows = imputed.iter().filter(|f| **f).count();
    if imputed_rows > 0 {
        tracing::info!(output = %spec.output, imputed_rows, "net liquidity rows with zero-imputed inputs");
    }

    table.with_column(Column {
        name: spec.output.clone(),
        values,
        provenance: Provenance::Derived { imputed },
    })
}

fn input_values<'a>(table: &'a AlignedTable, name: &str, missing: &'a [Option<f64>], output: &str) -> &'a [Option<f64>] {
    match table.column(name) {
        Some(col) => &col.values,
        None => {
            tracing::warn!(column = name, output, "net liquidity input absent; treated as zero");
            missing
        }
    }
}

/// The reported column, when configured, present and not entirely missing.
fn reported_column<'a>(table: &'a AlignedTable, spec: &NetLiquiditySpec) -> Option<&'a Column> {
    let name = spec.reported.as_deref()?;
    table.column(name).filter(|col| col.non_missing() > 0)
}
