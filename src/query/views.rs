//! Result shapes returned by the query service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregation::Totals;
use crate::model::DirectoryEntry;
use crate::storage::StoredReport;

/// One row of the dashboard's host list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSummary {
    pub host_name: String,
    pub host_ip: String,
    pub last_report: DateTime<Utc>,
    pub total_files: u64,
    pub total_size_mb: u64,
    pub total_size_gb: u64,
    pub report_count: u64,
}

impl HostSummary {
    pub fn new(row: &StoredReport, totals: &Totals, report_count: u64) -> Self {
        Self {
            host_name: row.host_name.clone(),
            host_ip: row.host_ip.clone(),
            last_report: row.created_at,
            total_files: totals.total_files,
            total_size_mb: totals.total_size_mb,
            total_size_gb: totals.total_size_gb,
            report_count,
        }
    }
}

/// One stored report in a host's history. `timestamp` is the server's
/// storage time, not the sender's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReport {
    pub id: i64,
    pub host_ip: String,
    pub host_name: String,
    pub timestamp: DateTime<Utc>,
    pub total_directories: i64,
    pub total_files: u64,
    pub total_size_mb: u64,
    pub total_size_gb: u64,
    pub directories: Vec<DirectoryEntry>,
}

impl HostReport {
    pub fn new(row: &StoredReport, totals: &Totals, directories: Vec<DirectoryEntry>) -> Self {
        Self {
            id: row.id,
            host_ip: row.host_ip.clone(),
            host_name: row.host_name.clone(),
            timestamp: row.created_at,
            total_directories: row.total_directories,
            total_files: totals.total_files,
            total_size_mb: totals.total_size_mb,
            total_size_gb: totals.total_size_gb,
            directories,
        }
    }
}

/// Audit viewer filter. `limit` of `None` means the configured default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogQuery {
    pub action: Option<String>,
    pub host_ip: Option<String>,
    pub limit: Option<usize>,
}
