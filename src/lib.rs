//! `liquidity-monitor` library crate.
//!
//! Aligns weekly macro/financial series (central-bank aggregates, Bitcoin,
//! equity indexes, money supply, sideline cash, sentiment) onto one weekly
//! calendar, derives net liquidity, and rescales columns to a common base of
//! 100 for comparison.
//!
//! The binary (`liq`) is a thin wrapper around this library so the pipeline
//! is testable without spawning processes.

pub mod align;
pub mod app;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod normalize;
pub mod report;
