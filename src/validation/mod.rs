//! Validation module.
//!
//! Rejects malformed submissions before any persistence is touched.

pub mod report;

pub use report::*;
