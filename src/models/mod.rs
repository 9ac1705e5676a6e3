//! Forecast model implementations.
//!
//! Models are implemented as small, pure functions over already-fetched
//! arrays so that the orchestration code can stay generic.

pub mod growth;
pub mod linear;

pub use growth::*;
pub use linear::*;
