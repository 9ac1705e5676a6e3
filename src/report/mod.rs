//! Reporting utilities: run summaries, forecast tables, score tables.

pub mod format;

pub use format::*;
