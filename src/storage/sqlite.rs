//! SQLite-backed store.
//!
//! One connection behind a mutex. Every statement is short, so callers from
//! different hosts only contend for the duration of a single query.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::model::{AuditEvent, DirectoryEntry, Report, StoredAuditEvent};

use super::models::{
    format_timestamp, AuditQuery, DirectoryInsertSummary, StorageError, StoredReport,
};
use super::queries;
use super::store::{AuditStore, ReportStore};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database file and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self::from_connection(conn)?;
        log::info!("DATABASE_OPENED path={}", path.as_ref().display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(queries::SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Read a stored RFC 3339 column back into UTC.
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_report(row: &Row<'_>) -> rusqlite::Result<StoredReport> {
    Ok(StoredReport {
        id: row.get(0)?,
        host_ip: row.get(1)?,
        host_name: row.get(2)?,
        base_path: row.get(3)?,
        total_directories: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        report_data: row.get(6)?,
    })
}

fn row_to_audit(row: &Row<'_>) -> rusqlite::Result<StoredAuditEvent> {
    Ok(StoredAuditEvent {
        id: row.get(0)?,
        event: AuditEvent {
            host_ip: row.get(1)?,
            action: row.get(2)?,
            status: row.get(3)?,
            message: row.get(4)?,
            details: row.get(5)?,
            created_at: timestamp_column(row, 6)?,
        },
    })
}

impl ReportStore for SqliteStore {
    fn latest_report_for(&self, host_ip: &str) -> Result<Option<StoredReport>, StorageError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &queries::build_latest_for_host(),
                params![host_ip],
                row_to_report,
            )
            .optional()?;
        Ok(row)
    }

    fn insert_report(&self, report: &Report, payload: &str) -> Result<i64, StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            queries::build_report_insert(),
            params![
                report.host_ip,
                report.host_name,
                report.base_path,
                report.declared_total_directories(),
                payload,
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All rows go in under one transaction, so the connection is held for a
    /// single commit. A row that fails only undoes its own statement.
    fn insert_directory_entries(
        &self,
        report_id: i64,
        entries: &[DirectoryEntry],
    ) -> DirectoryInsertSummary {
        let mut summary = DirectoryInsertSummary::default();
        let mut conn = self.conn.lock();

        let tx = match conn.transaction() {
            Ok(tx) => tx,
            Err(e) => {
                log::warn!(
                    "DIRECTORY_TX_BEGIN_FAILED report_id={} rows={} error={}",
                    report_id,
                    entries.len(),
                    e
                );
                summary.failed = entries.len();
                return summary;
            }
        };

        {
            let mut stmt = match tx.prepare_cached(queries::build_directory_insert()) {
                Ok(stmt) => stmt,
                Err(e) => {
                    log::warn!(
                        "DIRECTORY_PREPARE_FAILED report_id={} rows={} error={}",
                        report_id,
                        entries.len(),
                        e
                    );
                    summary.failed = entries.len();
                    return summary;
                }
            };

            for entry in entries {
                let result = stmt.execute(params![
                    report_id,
                    entry.path,
                    entry.file_count,
                    entry.size_bytes,
                    entry.size_mb
                ]);
                match result {
                    Ok(_) => summary.inserted += 1,
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
        }

        if let Err(e) = tx.commit() {
            log::warn!(
                "DIRECTORY_TX_COMMIT_FAILED report_id={} rows={} error={}",
                report_id,
                summary.inserted,
                e
            );
            summary.failed += summary.inserted;
            summary.inserted = 0;
        }

        summary
    }

    fn all_latest_per_host(&self) -> Result<Vec<StoredReport>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&queries::build_latest_per_host())?;
        let rows = stmt
            .query_map([], row_to_report)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn reports_for_host(
        &self,
        host_ip: &str,
        limit: usize,
    ) -> Result<Vec<StoredReport>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&queries::build_reports_for_host())?;
        let rows = stmt
            .query_map(params![host_ip, limit as i64], row_to_report)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn report_by_id(&self, id: i64) -> Result<Option<StoredReport>, StorageError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(&queries::build_report_by_id(), params![id], row_to_report)
            .optional()?;
        Ok(row)
    }

    fn count_reports_for_host(&self, host_ip: &str) -> Result<u64, StorageError> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row(queries::build_count_for_host(), params![host_ip], |r| r.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn directory_entries_for(&self, report_id: i64) -> Result<Vec<DirectoryEntry>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(queries::build_directories_for_report())?;
        let rows = stmt
            .query_map(params![report_id], |r| {
                Ok(DirectoryEntry {
                    path: r.get(0)?,
                    file_count: r.get(1)?,
                    size_bytes: r.get(2)?,
                    size_mb: r.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn ping(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
    }
}

impl AuditStore for SqliteStore {
    fn append_audit(&self, event: &AuditEvent) -> Result<i64, StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            queries::build_audit_insert(),
            params![
                event.host_ip,
                event.action,
                event.status,
                event.message,
                event.details,
                format_timestamp(&event.created_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn query_audit(&self, query: &AuditQuery) -> Result<Vec<StoredAuditEvent>, StorageError> {
        let sql = queries::build_audit_select(query.action.is_some(), query.host_ip.is_some());

        let mut bind_values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(action) = &query.action {
            bind_values.push(Box::new(action.clone()));
        }
        if let Some(host_ip) = &query.host_ip {
            bind_values.push(Box::new(host_ip.clone()));
        }
        bind_values.push(Box::new(query.limit as i64));
        let params_refs: Vec<&dyn ToSql> = bind_values.iter().map(|b| b.as_ref()).collect();

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_refs.as_slice(), row_to_audit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ACTION_RECEIVE, ACTION_SAVE, STATUS_NEW_HOST, STATUS_SKIPPED};

    fn report(host: &str, bytes: u64) -> Report {
        Report::new(host, "/srv", vec![DirectoryEntry::new("/srv/a", 3, bytes)])
    }

    fn insert(store: &SqliteStore, report: &Report) -> i64 {
        store
            .insert_report(report, &report.to_payload().unwrap())
            .unwrap()
    }

    #[test]
    fn test_latest_for_unknown_host() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.latest_report_for("10.0.0.1").unwrap().is_none());
    }

    #[test]
    fn test_insert_and_latest() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = insert(&store, &report("10.0.0.1", 100));
        let second = insert(&store, &report("10.0.0.1", 200));
        insert(&store, &report("10.0.0.2", 300));

        assert!(second > first);
        let latest = store.latest_report_for("10.0.0.1").unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.report().unwrap().directories[0].size_bytes, 200);
        assert_eq!(store.count_reports_for_host("10.0.0.1").unwrap(), 2);
    }

    #[test]
    fn test_latest_breaks_timestamp_ties_by_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = insert(&store, &report("10.0.0.1", 100));
        let second = insert(&store, &report("10.0.0.1", 200));

        store
            .conn
            .lock()
            .execute(
                "UPDATE file_reports SET created_at = '2026-01-29T10:00:00.000000Z'",
                [],
            )
            .unwrap();

        let latest = store.latest_report_for("10.0.0.1").unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_ne!(latest.id, first);
    }

    #[test]
    fn test_all_latest_per_host_one_row_each() {
        let store = SqliteStore::open_in_memory().unwrap();
        insert(&store, &report("a", 1));
        let a2 = insert(&store, &report("a", 2));
        let b1 = insert(&store, &report("b", 3));

        let latest = store.all_latest_per_host().unwrap();
        let mut ids: Vec<i64> = latest.iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec![a2, b1]);
    }

    #[test]
    fn test_reports_for_host_limit_and_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ids: Vec<i64> = (0..5).map(|i| insert(&store, &report("h", i))).collect();

        let rows = store.reports_for_host("h", 3).unwrap();
        let got: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(got, vec![ids[4], ids[3], ids[2]]);
    }

    #[test]
    fn test_directory_rows_partial_failure() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = insert(&store, &report("h", 1));

        let entries = vec![
            DirectoryEntry::new("/ok-1", 1, 10),
            DirectoryEntry::new("/too-big", 1, u64::MAX),
            DirectoryEntry::new("/ok-2", 2, 20),
        ];
        let summary = store.insert_directory_entries(id, &entries);
        assert_eq!(summary, DirectoryInsertSummary { inserted: 2, failed: 1 });

        let rows = store.directory_entries_for(id).unwrap();
        let paths: Vec<&str> = rows.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["/ok-1", "/ok-2"]);
    }

    #[test]
    fn test_large_directory_batch_lands_in_one_commit() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = insert(&store, &report("10.0.0.1", 1));
        let entries: Vec<DirectoryEntry> = (0..2_000)
            .map(|i| DirectoryEntry::new(&format!("/srv/d{i}"), 1, i))
            .collect();

        let summary = store.insert_directory_entries(id, &entries);
        assert_eq!(summary, DirectoryInsertSummary { inserted: 2_000, failed: 0 });
        assert_eq!(store.directory_entries_for(id).unwrap().len(), 2_000);
        assert!(store.conn.lock().is_autocommit());
    }

    #[test]
    fn test_other_hosts_are_readable_after_large_batch() {
        let store = std::sync::Arc::new(SqliteStore::open_in_memory().unwrap());
        let other = insert(&store, &report("other-host", 5));
        let id = insert(&store, &report("10.0.0.1", 1));
        let entries: Vec<DirectoryEntry> = (0..500)
            .map(|i| DirectoryEntry::new(&format!("/srv/d{i}"), 1, i))
            .collect();

        std::thread::scope(|s| {
            let writer = s.spawn(|| store.insert_directory_entries(id, &entries));
            let reader = s.spawn(|| store.latest_report_for("other-host").unwrap());
            assert_eq!(writer.join().unwrap().inserted, 500);
            assert_eq!(reader.join().unwrap().unwrap().id, other);
        });
    }

    #[test]
    fn test_report_by_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let original = report("h", 42).with_host_name("box");
        let payload = original.to_payload().unwrap();
        let id = store.insert_report(&original, &payload).unwrap();

        let stored = store.report_by_id(id).unwrap().unwrap();
        assert_eq!(stored.report_data, payload);
        assert_eq!(stored.host_name, "box");
        assert!(store.report_by_id(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_audit_filters() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .append_audit(&AuditEvent::new("a", ACTION_SAVE, STATUS_NEW_HOST, "new"))
            .unwrap();
        store
            .append_audit(&AuditEvent::new("a", ACTION_RECEIVE, STATUS_SKIPPED, "same"))
            .unwrap();
        store
            .append_audit(&AuditEvent::new("b", ACTION_SAVE, STATUS_NEW_HOST, "new"))
            .unwrap();

        let all = store.query_audit(&AuditQuery::new(100)).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].id > all[2].id);

        let saves = store.query_audit(&AuditQuery::new(100).action(ACTION_SAVE)).unwrap();
        assert_eq!(saves.len(), 2);

        let a_saves = store
            .query_audit(&AuditQuery::new(100).action(ACTION_SAVE).host("a"))
            .unwrap();
        assert_eq!(a_saves.len(), 1);
        assert_eq!(a_saves[0].event.message, "new");

        let limited = store.query_audit(&AuditQuery::new(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_corrupt_timestamp_is_a_storage_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        insert(&store, &report("h", 1));
        store
            .conn
            .lock()
            .execute("UPDATE file_reports SET created_at = 'yesterday'", [])
            .unwrap();

        assert!(matches!(
            store.latest_report_for("h"),
            Err(StorageError::Sqlite(_))
        ));
    }

    #[test]
    fn test_ping() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.ping().is_ok());
    }
}
