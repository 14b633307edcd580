//! Pipeline orchestration module.
//!
//! Report ingestion pipeline that coordinates:
//! - Validation and security screening
//! - Aggregation
//! - Dedup against the host's latest report
//! - Storage
//! - Audit recording

pub mod context;
pub mod decision;
pub mod host_locks;
pub mod ingestion;

pub use context::*;
pub use decision::*;
pub use host_locks::*;
pub use ingestion::*;
