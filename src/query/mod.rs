//! Query module.
//!
//! Read paths for the dashboard and the audit viewer. Totals are recomputed
//! from each report's retained payload on every read.

pub mod service;
pub mod views;

pub use service::*;
pub use views::*;
