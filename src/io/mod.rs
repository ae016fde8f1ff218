//! Input/output helpers.
//!
//! - workbook directory read/write (`workbook`)
//! - header role matching (`roles`)
//! - sections -> series (`ingest`)
//! - table exports (`export`)

pub mod export;
pub mod ingest;
pub mod roles;
pub mod workbook;

pub use export::*;
pub use ingest::*;
pub use roles::*;
pub use workbook::*;
