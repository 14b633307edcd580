//! Audit event shapes.
//!
//! Actions and statuses are open vocabularies: the constants below are the
//! values this crate emits, but stored rows may carry anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ACTION_RECEIVE: &str = "RECEIVE";
pub const ACTION_UPDATE: &str = "UPDATE";
pub const ACTION_VALIDATE: &str = "VALIDATE";
pub const ACTION_SAVE: &str = "SAVE";

pub const STATUS_NEW_HOST: &str = "NEW_HOST";
pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_SKIPPED: &str = "SKIPPED";
pub const STATUS_ERROR: &str = "ERROR";

/// Host id recorded when a payload was too broken to name its host.
pub const UNKNOWN_HOST: &str = "unknown";

/// One ingestion attempt as seen by the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub host_ip: String,
    pub action: String,
    pub status: String,
    pub message: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(host_ip: &str, action: &str, status: &str, message: &str) -> Self {
        Self {
            host_ip: host_ip.to_string(),
            action: action.to_string(),
            status: status.to_string(),
            message: message.to_string(),
            details: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Render the append-only text log line.
    pub fn log_line(&self) -> String {
        format!(
            "[{}] {} | {} | {} | {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S"),
            self.host_ip,
            self.action,
            self.status,
            self.message
        )
    }
}

/// An audit event as read back from the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuditEvent {
    pub id: i64,
    #[serde(flatten)]
    pub event: AuditEvent,
}
