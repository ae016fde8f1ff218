//! Pairwise Pearson correlation over indexed columns.

use crate::domain::IndexedTable;

/// Symmetric correlation matrix. `None` where a pair has fewer than two
/// complete observations or zero variance.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        self.values[i][j]
    }

    /// Column with the largest absolute correlation to `anchor`, and its
    /// signed value. Ties keep the earlier column.
    pub fn strongest_with(&self, anchor: &str) -> Option<(String, f64)> {
        let i = self.names.iter().position(|n| n == anchor)?;
        let mut best: Option<(usize, f64)> = None;
        for (j, value) in self.values[i].iter().enumerate() {
            if j == i {
                continue;
            }
            let Some(r) = *value else { continue };
            if best.is_none_or(|(_, b)| r.abs() > b.abs()) {
                best = Some((j, r));
            }
        }
        best.map(|(j, r)| (self.names[j].clone(), r))
    }
}

/// Pearson correlation over rows where both inputs are present.
pub fn pearson_pairwise(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

/// Correlation matrix over `columns` (all indexed columns when empty).
/// Names not present in the table are skipped.
pub fn correlation_matrix(table: &IndexedTable, columns: &[String]) -> CorrelationMatrix {
    let selected: Vec<_> = if columns.is_empty() {
        table.columns().iter().collect()
    } else {
        columns.iter().filter_map(|name| table.column(name)).collect()
    };

    let values = selected
        .iter()
        .enumerate()
        .map(|(i, a)| {
            selected
                .iter()
                .enumerate()
                .map(|(j, b)| {
                    if i == j {
                        // Self-correlation is 1 only when the column varies.
                        pearson_pairwise(&a.values, &a.values)
                    } else {
                        pearson_pairwise(&a.values, &b.values)
                    }
                })
                .collect()
        })
        .collect();

    CorrelationMatrix {
        names: selected.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}
