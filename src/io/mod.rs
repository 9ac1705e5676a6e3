//! Input/output helpers.
//!
//! - forecast exports (CSV) (`export`)
//! - stack JSON read/write (`stack`)

pub mod export;
pub mod stack;

pub use export::*;
pub use stack::*;
