//! Aggregation module.
//!
//! Totals over a report's directory list, recomputed wherever they are needed.

pub mod totals;

pub use totals::*;
