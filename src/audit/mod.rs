//! Audit module.
//!
//! Every ingestion attempt is written to two independent sinks: the durable
//! audit table and an append-only text log for operators.

pub mod recorder;
pub mod text_log;

pub use recorder::*;
pub use text_log::*;
