//! Report model.
//!
//! Canonical in-memory shapes of submitted inventory reports and of the
//! audit events recorded for every ingestion attempt.

pub mod audit;
pub mod report;

pub use audit::*;
pub use report::*;
