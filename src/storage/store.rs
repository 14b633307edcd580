//! Storage traits.
//!
//! The ingestion engine and query service only see these traits; the SQLite
//! and in-memory stores both implement them.

use crate::model::{AuditEvent, DirectoryEntry, Report, StoredAuditEvent};

use super::models::{AuditQuery, DirectoryInsertSummary, StorageError, StoredReport};

pub trait ReportStore: Send + Sync {
    /// Newest report for the host (max `created_at`, then max `id`).
    fn latest_report_for(&self, host_ip: &str) -> Result<Option<StoredReport>, StorageError>;

    /// Insert a new report row and return its id. Never updates.
    fn insert_report(&self, report: &Report, payload: &str) -> Result<i64, StorageError>;

    /// Insert one row per directory. A failing row is logged and skipped;
    /// the rest are still attempted.
    fn insert_directory_entries(
        &self,
        report_id: i64,
        entries: &[DirectoryEntry],
    ) -> DirectoryInsertSummary;

    /// Latest report of every host, newest first.
    fn all_latest_per_host(&self) -> Result<Vec<StoredReport>, StorageError>;

    /// Reports of one host, newest first, at most `limit`.
    fn reports_for_host(&self, host_ip: &str, limit: usize)
        -> Result<Vec<StoredReport>, StorageError>;

    fn report_by_id(&self, id: i64) -> Result<Option<StoredReport>, StorageError>;

    fn count_reports_for_host(&self, host_ip: &str) -> Result<u64, StorageError>;

    fn directory_entries_for(&self, report_id: i64) -> Result<Vec<DirectoryEntry>, StorageError>;

    /// Cheap liveness check for health probes.
    fn ping(&self) -> Result<(), StorageError>;
}

pub trait AuditStore: Send + Sync {
    /// Append one audit row and return its id.
    fn append_audit(&self, event: &AuditEvent) -> Result<i64, StorageError>;

    /// Audit rows matching the query, newest first.
    fn query_audit(&self, query: &AuditQuery) -> Result<Vec<StoredAuditEvent>, StorageError>;
}
