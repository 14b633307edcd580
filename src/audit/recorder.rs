//! Audit recorder.
//!
//! Fans one event out to the structured store and the text log. Each sink is
//! attempted regardless of the other; failures go to the operator log and are
//! never returned to the caller.

use std::sync::Arc;

use crate::logging::structured::LogContext;
use crate::model::AuditEvent;
use crate::storage::AuditStore;

use super::text_log::TextAuditLog;

/// Which sinks accepted an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditReceipt {
    pub stored_id: Option<i64>,
    pub text_written: bool,
}

pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
    text_log: Option<TextAuditLog>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>, text_log: TextAuditLog) -> Self {
        Self {
            store,
            text_log: Some(text_log),
        }
    }

    /// Structured sink only.
    pub fn without_text_log(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            text_log: None,
        }
    }

    pub fn record(&self, event: &AuditEvent, ctx: &LogContext) -> AuditReceipt {
        let mut receipt = AuditReceipt::default();

        match self.store.append_audit(event) {
            Ok(id) => receipt.stored_id = Some(id),
            Err(e) => {
                log::error!(
                    "{} AUDIT_STORE_FAILED action={} status={} error={}",
                    ctx,
                    event.action,
                    event.status,
                    e
                );
            }
        }

        if let Some(text_log) = &self.text_log {
            match text_log.append(event) {
                Ok(()) => receipt.text_written = true,
                Err(e) => {
                    log::error!(
                        "{} AUDIT_LOG_WRITE_FAILED path={} error={}",
                        ctx,
                        text_log.path().display(),
                        e
                    );
                }
            }
        }

        log::debug!(
            "{} AUDIT_RECORDED action={} status={} stored={} text={}",
            ctx,
            event.action,
            event.status,
            receipt.stored_id.is_some(),
            receipt.text_written
        );

        receipt
    }
}
