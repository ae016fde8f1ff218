//! Error types.
//!
//! Two layers:
//!
//! - [`PipelineError`]: the alignment/indexing taxonomy. These are mostly
//!   *diagnostics*: a missing section or a zero base only disables the affected
//!   series, so they are collected on the run output rather than returned.
//! - [`AppError`]: what the `liq` binary exits with (message + exit code).

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::ColumnRole;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Align,
    Index,
    Correlate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Align => "align",
            Stage::Index => "index",
            Stage::Correlate => "correlate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A configured section is absent from the workbook. Its series align as
    /// entirely missing.
    #[error("ingest: section `{section}` not found in workbook")]
    MissingSection { section: String },

    /// A section exists but no header matches the requested role.
    #[error("ingest: section `{section}` has no column matching role `{role}`")]
    MissingColumn { section: String, role: ColumnRole },

    /// The first non-missing value of a column is exactly zero.
    #[error("index: column `{column}` has a zero base value on {date}; cannot index")]
    ZeroBase { column: String, date: NaiveDate },

    /// A column has no non-missing values (or does not exist) at this stage.
    #[error("{stage}: column `{column}` has no values")]
    NoData { column: String, stage: Stage },

    /// None of the configured sections were found. Fatal.
    #[error("no input sections found (expected any of: {expected})")]
    NoInputs { expected: String },
}

impl PipelineError {
    /// Series/column the error refers to, when it refers to exactly one.
    pub fn column(&self) -> Option<&str> {
        match self {
            PipelineError::ZeroBase { column, .. } | PipelineError::NoData { column, .. } => Some(column),
            _ => None,
        }
    }
}

/// Error returned by the binary entry point.
///
/// Exit codes:
/// - 2: input/config problem (bad path, bad JSON, bad flag)
/// - 3: no usable data
/// - 4: external provider failure
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NoInputs { .. } | PipelineError::NoData { .. } | PipelineError::ZeroBase { .. } => {
                AppError::no_data(err.to_string())
            }
            PipelineError::MissingSection { .. } | PipelineError::MissingColumn { .. } => {
                AppError::input(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_taxonomy() {
        let fatal = PipelineError::NoInputs {
            expected: "Liquidity Data".to_string(),
        };
        let local = PipelineError::MissingSection {
            section: "Bitcoin".to_string(),
        };
        assert_eq!(AppError::from(fatal).exit_code(), 3);
        assert_eq!(AppError::from(local).exit_code(), 2);
    }

    #[test]
    fn messages_name_the_column_and_stage() {
        let err = PipelineError::NoData {
            column: "SPX".to_string(),
            stage: Stage::Index,
        };
        assert_eq!(err.to_string(), "index: column `SPX` has no values");
        assert_eq!(err.column(), Some("SPX"));

        let err = PipelineError::MissingColumn {
            section: "Bitcoin".to_string(),
            role: ColumnRole::Close,
        };
        assert!(err.to_string().contains("Bitcoin"));
        assert!(err.to_string().contains("close"));
    }
}
