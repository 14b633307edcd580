//! Request context management.
//!
//! Provides per-request ids for logging and audit correlation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one ingestion request.
#[derive(Debug, Clone)]
pub struct IngestContext {
    pub request_id: String,
    pub received_at: DateTime<Utc>,
}

impl IngestContext {
    pub fn new() -> Self {
        Self {
            request_id: format!("req-{}", &Uuid::new_v4().simple().to_string()[..8]),
            received_at: Utc::now(),
        }
    }

    /// Reuse an id handed over by the transport layer.
    pub fn with_request_id(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            received_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.request_id)
    }

    pub fn host_context(&self, host_ip: &str) -> LogContext {
        self.log_context().with_host(host_ip)
    }
}

impl Default for IngestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = IngestContext::new();
        let b = IngestContext::new();
        assert!(a.request_id.starts_with("req-"));
        assert_eq!(a.request_id.len(), 12);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_host_context() {
        let ctx = IngestContext::with_request_id("req-abc");
        assert_eq!(
            ctx.host_context("10.0.0.5").to_string(),
            "[request=req-abc] [host=10.0.0.5]"
        );
    }
}
