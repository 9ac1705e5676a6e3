//! Survey score handling: label quantization and per-period aggregation.

pub mod aggregate;
pub mod scale;

pub use aggregate::*;
pub use scale::*;
