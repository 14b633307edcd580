//! In-memory store.
//!
//! Mirrors the SQLite store's ordering and integer-range behaviour without a
//! database file. Used by tests and benchmarks, and as a stand-in while the
//! database is being migrated.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::RwLock;

use crate::model::{AuditEvent, DirectoryEntry, Report, StoredAuditEvent};

use super::models::{AuditQuery, DirectoryInsertSummary, StorageError, StoredReport};
use super::store::{AuditStore, ReportStore};

#[derive(Debug, Default)]
struct MemoryState {
    reports: Vec<StoredReport>,
    directories: Vec<(i64, DirectoryEntry)>,
    audits: Vec<StoredAuditEvent>,
    last_report_id: i64,
    last_audit_id: i64,
}

#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while unavailable every fallible call errors.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn report_count(&self) -> usize {
        self.state.read().reports.len()
    }

    pub fn audit_count(&self) -> usize {
        self.state.read().audits.len()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory store offline".to_string()))
        }
    }
}

/// Newest first: `created_at` descending, then `id` descending.
fn newest_first(a: &StoredReport, b: &StoredReport) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn fits_integer_column(entry: &DirectoryEntry) -> bool {
    i64::try_from(entry.file_count).is_ok() && i64::try_from(entry.size_bytes).is_ok()
}

impl ReportStore for MemoryStore {
    fn latest_report_for(&self, host_ip: &str) -> Result<Option<StoredReport>, StorageError> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state
            .reports
            .iter()
            .filter(|r| r.host_ip == host_ip)
            .min_by(|a, b| newest_first(a, b))
            .cloned())
    }

    fn insert_report(&self, report: &Report, payload: &str) -> Result<i64, StorageError> {
        self.check_available()?;
        let mut state = self.state.write();
        state.last_report_id += 1;
        let id = state.last_report_id;
        state.reports.push(StoredReport {
            id,
            host_ip: report.host_ip.clone(),
            host_name: report.host_name.clone(),
            base_path: report.base_path.clone(),
            total_directories: report.declared_total_directories(),
            created_at: Utc::now(),
            report_data: payload.to_string(),
        });
        Ok(id)
    }

    fn insert_directory_entries(
        &self,
        report_id: i64,
        entries: &[DirectoryEntry],
    ) -> DirectoryInsertSummary {
        let mut summary = DirectoryInsertSummary::default();
        let available = self.check_available();
        let mut state = self.state.write();

        for entry in entries {
            let outcome = match &available {
                Err(e) => Err(e.to_string()),
                Ok(()) if !fits_integer_column(entry) => {
                    Err("integer out of range".to_string())
                }
                Ok(()) => Ok(()),
            };
            match outcome {
                Ok(()) => {
                    state.directories.push((report_id, entry.clone()));
                    summary.inserted += 1;
                }
                Err(e) => {
                    log::warn!(
                        "DIRECTORY_INSERT_FAILED report_id={} path={} error={}",
                        report_id,
                        entry.path,
                        e
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    fn all_latest_per_host(&self) -> Result<Vec<StoredReport>, StorageError> {
        self.check_available()?;
        let state = self.state.read();
        let mut sorted: Vec<&StoredReport> = state.reports.iter().collect();
        sorted.sort_by(|a, b| newest_first(a, b));

        let mut seen = HashSet::new();
        Ok(sorted
            .into_iter()
            .filter(|r| seen.insert(r.host_ip.clone()))
            .cloned()
            .collect())
    }

    fn reports_for_host(
        &self,
        host_ip: &str,
        limit: usize,
    ) -> Result<Vec<StoredReport>, StorageError> {
        self.check_available()?;
        let state = self.state.read();
        let mut rows: Vec<StoredReport> = state
            .reports
            .iter()
            .filter(|r| r.host_ip == host_ip)
            .cloned()
            .collect();
        rows.sort_by(newest_first);
        rows.truncate(limit);
        Ok(rows)
    }

    fn report_by_id(&self, id: i64) -> Result<Option<StoredReport>, StorageError> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state.reports.iter().find(|r| r.id == id).cloned())
    }

    fn count_reports_for_host(&self, host_ip: &str) -> Result<u64, StorageError> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state.reports.iter().filter(|r| r.host_ip == host_ip).count() as u64)
    }

    fn directory_entries_for(&self, report_id: i64) -> Result<Vec<DirectoryEntry>, StorageError> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state
            .directories
            .iter()
            .filter(|(id, _)| *id == report_id)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    fn ping(&self) -> Result<(), StorageError> {
        self.check_available()
    }
}

impl AuditStore for MemoryStore {
    fn append_audit(&self, event: &AuditEvent) -> Result<i64, StorageError> {
        self.check_available()?;
        let mut state = self.state.write();
        state.last_audit_id += 1;
        let id = state.last_audit_id;
        state.audits.push(StoredAuditEvent {
            id,
            event: event.clone(),
        });
        Ok(id)
    }

    fn query_audit(&self, query: &AuditQuery) -> Result<Vec<StoredAuditEvent>, StorageError> {
        self.check_available()?;
        let state = self.state.read();
        let mut rows: Vec<StoredAuditEvent> = state
            .audits
            .iter()
            .filter(|a| query.action.as_deref().map_or(true, |x| a.event.action == x))
            .filter(|a| query.host_ip.as_deref().map_or(true, |h| a.event.host_ip == h))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.event
                .created_at
                .cmp(&a.event.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(query.limit);
        Ok(rows)
    }
}
