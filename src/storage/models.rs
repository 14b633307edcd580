//! Database models for report storage.
//!
//! These models represent the structure of data in the database tables.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Report;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A row of `file_reports`.
///
/// `report_data` is the serialized report exactly as it was stored; the
/// directory list and totals are always derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: i64,
    pub host_ip: String,
    pub host_name: String,
    pub base_path: String,
    pub total_directories: i64,
    pub created_at: DateTime<Utc>,
    pub report_data: String,
}

impl StoredReport {
    /// Decode the retained payload.
    pub fn report(&self) -> Result<Report, StorageError> {
        Ok(Report::from_payload(&self.report_data)?)
    }
}

/// Outcome of writing the per-directory rows of one report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryInsertSummary {
    pub inserted: usize,
    pub failed: usize,
}

impl DirectoryInsertSummary {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Filter for audit trail reads. Results are newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    pub action: Option<String>,
    pub host_ip: Option<String>,
    pub limit: usize,
}

impl AuditQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            action: None,
            host_ip: None,
            limit,
        }
    }

    pub fn action(mut self, action: &str) -> Self {
        self.action = Some(action.to_string());
        self
    }

    pub fn host(mut self, host_ip: &str) -> Self {
        self.host_ip = Some(host_ip.to_string());
        self
    }
}

/// Fixed-width UTC rendering so stored timestamps sort lexically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2026, 1, 29, 10, 0, 0).unwrap();
        assert_eq!(format_timestamp(&whole), "2026-01-29T10:00:00.000000Z");

        let later = whole + chrono::Duration::microseconds(1);
        assert!(format_timestamp(&later) > format_timestamp(&whole));
    }

    #[test]
    fn test_stored_report_decodes_payload() {
        let report = Report::new("10.0.0.5", "/srv", vec![]);
        let stored = StoredReport {
            id: 1,
            host_ip: report.host_ip.clone(),
            host_name: String::new(),
            base_path: report.base_path.clone(),
            total_directories: 0,
            created_at: Utc::now(),
            report_data: report.to_payload().unwrap(),
        };
        assert_eq!(stored.report().unwrap(), report);

        let broken = StoredReport {
            report_data: "{".to_string(),
            ..stored
        };
        assert!(matches!(broken.report(), Err(StorageError::Payload(_))));
    }
}
