//! fsreport core - filesystem inventory report ingestion
//!
//! Agents on file servers periodically submit a JSON inventory of their
//! directory tree. This crate ingests those reports, stores a new row only
//! when a host's total size changed, keeps an audit trail of every attempt,
//! and answers the dashboard's read queries. The implementation prioritizes:
//!
//! 1. **Auditability** - every submission leaves an audit row and a log line
//! 2. **Logging** - every decision point logged with request context
//! 3. **Durability** - insert-only history, partial directory failures tolerated
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Ingestion orchestrator and dedup decision
//! - `validation` - Body size and JSON shape checks
//! - `security` - Content screening and payload fingerprints
//! - `aggregation` - File and size totals over a directory list
//! - `storage` - Store traits, SQLite and in-memory backends
//! - `audit` - Dual-sink audit recorder
//! - `query` - Host summaries, history, report detail, audit viewer
//! - `api` - Status code and JSON body for each transport endpoint
//! - `config` - Environment-driven settings and service wiring
//! - `logging` - Structured logging with request context

pub mod aggregation;
pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod security;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{AuditEvent, DirectoryEntry, Report};
pub use pipeline::{IngestOutcome, IngestResult, IngestionEngine};
pub use query::QueryService;

/// Initialize the process-wide logger. Safe to call more than once.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}
