//! Query service.
//!
//! Rebuilds host summaries, history and report detail from stored rows.
//! A row whose payload no longer decodes is logged and left out of lists.

use std::sync::Arc;

use crate::aggregation::aggregate;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Report, StoredAuditEvent};
use crate::storage::{AuditQuery, AuditStore, ReportStore, StorageError, StoredReport};
use crate::validation::ValidationError;

use super::views::{AuditLogQuery, HostReport, HostSummary};

pub struct QueryService {
    reports: Arc<dyn ReportStore>,
    audits: Arc<dyn AuditStore>,
    config: Config,
}

/// Decode a row's payload, logging and dropping it if it is unreadable.
fn decode_row(row: &StoredReport) -> Option<Report> {
    match row.report() {
        Ok(report) => Some(report),
        Err(e) => {
            log::warn!(
                "REPORT_PAYLOAD_UNREADABLE report_id={} host={} error={}",
                row.id,
                row.host_ip,
                e
            );
            None
        }
    }
}

fn non_empty_filter(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl QueryService {
    pub fn new(reports: Arc<dyn ReportStore>, audits: Arc<dyn AuditStore>, config: Config) -> Self {
        Self {
            reports,
            audits,
            config,
        }
    }

    /// Latest report of every host with recomputed totals, newest first.
    pub fn host_summaries(&self) -> Result<Vec<HostSummary>> {
        let rows = self.reports.all_latest_per_host()?;
        let mut hosts = Vec::with_capacity(rows.len());

        for row in &rows {
            let Some(report) = decode_row(row) else {
                continue;
            };
            let totals = aggregate(&report.directories);
            let count = self.reports.count_reports_for_host(&row.host_ip)?;
            hosts.push(HostSummary::new(row, &totals, count));
        }

        log::info!("HOST_SUMMARIES_RETURNED hosts={}", hosts.len());
        Ok(hosts)
    }

    /// A host's reports, newest first, at most `limit` (default from config).
    ///
    /// `host_ip` is matched exactly as it was stored; only an all-blank value
    /// is rejected.
    pub fn host_history(&self, host_ip: &str, limit: Option<usize>) -> Result<Vec<HostReport>> {
        if host_ip.trim().is_empty() {
            return Err(Error::MalformedInput(ValidationError::MissingHost));
        }

        let limit = self.config.resolve_limit(limit, self.config.history_limit);
        let rows = self.reports.reports_for_host(host_ip, limit)?;
        if rows.is_empty() {
            return Err(Error::NotFound(format!("host {host_ip}")));
        }

        let history: Vec<HostReport> = rows
            .iter()
            .filter_map(|row| {
                let report = decode_row(row)?;
                let totals = aggregate(&report.directories);
                Some(HostReport::new(row, &totals, report.directories))
            })
            .collect();

        log::debug!(
            "HOST_HISTORY_RETURNED host={} rows={} limit={}",
            host_ip,
            history.len(),
            limit
        );
        Ok(history)
    }

    /// Round-trip to the report store, for health checks.
    pub fn ping(&self) -> std::result::Result<(), StorageError> {
        self.reports.ping()
    }

    /// The stored payload of one report, exactly as it was written.
    pub fn report_detail(&self, id: i64) -> Result<String> {
        match self.reports.report_by_id(id)? {
            Some(row) => Ok(row.report_data),
            None => Err(Error::NotFound(format!("report {id}"))),
        }
    }

    /// Audit rows, newest first, optionally filtered by action and host.
    pub fn audit_log(&self, query: &AuditLogQuery) -> Result<Vec<StoredAuditEvent>> {
        let limit = self.config.resolve_limit(query.limit, self.config.audit_limit);
        let mut filter = AuditQuery::new(limit);
        if let Some(action) = non_empty_filter(query.action.as_deref()) {
            filter = filter.action(action);
        }
        if let Some(host_ip) = non_empty_filter(query.host_ip.as_deref()) {
            filter = filter.host(host_ip);
        }

        Ok(self.audits.query_audit(&filter)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditRecorder;
    use crate::model::{DirectoryEntry, ACTION_RECEIVE, ACTION_SAVE};
    use crate::pipeline::IngestionEngine;
    use crate::storage::MemoryStore;

    fn setup() -> (IngestionEngine, QueryService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = IngestionEngine::new(store.clone(), AuditRecorder::without_text_log(store.clone()));
        let queries = QueryService::new(store.clone(), store.clone(), Config::default());
        (engine, queries, store)
    }

    fn report(host: &str, bytes: u64, files: u64) -> Report {
        Report::new(host, "/data", vec![DirectoryEntry::new("/data/a", files, bytes)])
            .with_host_name(&format!("{host}-name"))
    }

    #[test]
    fn test_summaries_use_each_hosts_own_latest() {
        let (engine, queries, _store) = setup();
        engine.ingest(report("a", 1_048_576, 10));
        engine.ingest(report("a", 3 * 1_048_576, 30));
        engine.ingest(report("b", 2 * 1_048_576, 20));

        let hosts = queries.host_summaries().unwrap();
        assert_eq!(hosts.len(), 2);

        let a = hosts.iter().find(|h| h.host_ip == "a").unwrap();
        assert_eq!(a.total_files, 30);
        assert_eq!(a.total_size_mb, 3);
        assert_eq!(a.report_count, 2);
        assert_eq!(a.host_name, "a-name");

        let b = hosts.iter().find(|h| h.host_ip == "b").unwrap();
        assert_eq!(b.total_files, 20);
        assert_eq!(b.report_count, 1);
    }

    #[test]
    fn test_history_newest_first_with_limit() {
        let (engine, queries, _store) = setup();
        let first = engine.ingest(report("h", 100, 1)).report_id.unwrap();
        let second = engine.ingest(report("h", 200, 1)).report_id.unwrap();
        let third = engine.ingest(report("h", 300, 1)).report_id.unwrap();

        let history = queries.host_history("h", None).unwrap();
        let ids: Vec<i64> = history.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![third, second, first]);
        assert_eq!(history[0].directories.len(), 1);

        assert_eq!(queries.host_history("h", Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_history_errors() {
        let (_engine, queries, _store) = setup();
        assert!(matches!(queries.host_history("nobody", None), Err(Error::NotFound(_))));
        assert!(matches!(queries.host_history(" ", None), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_history_matches_host_exactly() {
        let (engine, queries, _store) = setup();
        engine.ingest(report("10.0.0.5 ", 100, 1));

        let hosts = queries.host_summaries().unwrap();
        assert_eq!(hosts[0].host_ip, "10.0.0.5 ");
        assert_eq!(queries.host_history(&hosts[0].host_ip, None).unwrap().len(), 1);
        assert!(matches!(queries.host_history("10.0.0.5", None), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let (engine, queries, store) = setup();
        engine.ingest(report("good", 1, 1));
        store.insert_report(&report("bad", 1, 1), "{").unwrap();

        let hosts = queries.host_summaries().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].host_ip, "good");
    }

    #[test]
    fn test_report_detail_is_verbatim() {
        let (_engine, queries, store) = setup();
        let payload = r#"{"host_ip":"h","directories":[],"custom":true}"#;
        let id = store.insert_report(&report("h", 0, 0), payload).unwrap();

        assert_eq!(queries.report_detail(id).unwrap(), payload);
        assert!(matches!(queries.report_detail(id + 1), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_audit_log_filters() {
        let (engine, queries, _store) = setup();
        engine.ingest(report("a", 1, 1));
        engine.ingest(report("a", 1, 1));
        engine.ingest(report("b", 1, 1));

        assert_eq!(queries.audit_log(&AuditLogQuery::default()).unwrap().len(), 3);

        let skips = queries
            .audit_log(&AuditLogQuery {
                action: Some(ACTION_RECEIVE.to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(skips.len(), 1);

        let saves_for_b = queries
            .audit_log(&AuditLogQuery {
                action: Some(ACTION_SAVE.to_string()),
                host_ip: Some("b".to_string()),
                limit: Some(10),
            })
            .unwrap();
        assert_eq!(saves_for_b.len(), 1);

        let blank_filter = queries
            .audit_log(&AuditLogQuery {
                host_ip: Some("".to_string()),
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(blank_filter.len(), 2);
    }
}
