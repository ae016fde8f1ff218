//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw input series (`Observation`, `TimeSeries`)
//! - alignment configuration (`AlignStrategy`, `ColumnRole`, `SeriesSpec`)
//! - derived outputs (`AlignedTable`, `IndexedTable`)

pub mod types;

pub use types::*;
