//! Main report ingestion pipeline.
//!
//! Coordinates the report processing workflow:
//! 1. Parse and validate (raw submissions only)
//! 2. Security screening
//! 3. Aggregate the new report
//! 4. Look up the host's latest stored report
//! 5. Dedup decision (new host / updated / skipped)
//! 6. Store the report row and its directory rows
//! 7. Record exactly one audit event
//!
//! The latest-report lookup and the write are not one transaction. When
//! per-host serialization is on (the default) they run under a host-keyed
//! mutex, so concurrent submissions for one host cannot both write.

use std::sync::Arc;

use crate::aggregation::{aggregate, Totals};
use crate::audit::AuditRecorder;
use crate::error::Error;
use crate::logging::structured::LogContext;
use crate::model::{
    AuditEvent, Report, ACTION_SAVE, ACTION_VALIDATE, STATUS_ERROR, UNKNOWN_HOST,
};
use crate::security::{compute_hash, screen_report};
use crate::storage::{ReportStore, StorageError};
use crate::validation::{parse_report, salvage_host_ip};

use super::context::IngestContext;
use super::decision::{decide, IngestOutcome, IngestResult};
use super::host_locks::HostLocks;

pub struct IngestionEngine {
    reports: Arc<dyn ReportStore>,
    recorder: AuditRecorder,
    host_locks: Option<HostLocks>,
}

/// What was decided and written, before auditing.
struct Applied {
    report_id: i64,
    outcome: IngestOutcome,
    previous_total_bytes: Option<u64>,
    payload_hash: Option<String>,
    failed_directories: usize,
}

impl IngestionEngine {
    pub fn new(reports: Arc<dyn ReportStore>, recorder: AuditRecorder) -> Self {
        Self {
            reports,
            recorder,
            host_locks: Some(HostLocks::new()),
        }
    }

    /// Turn per-host serialization on or off. Off reproduces the plain
    /// read-then-write race: concurrent identical submissions may each store a row.
    pub fn with_per_host_serialization(mut self, enabled: bool) -> Self {
        self.host_locks = if enabled { Some(HostLocks::new()) } else { None };
        self
    }

    /// Ingest an already-parsed report.
    ///
    /// Storage problems come back as `IngestOutcome::Failed`; an audit event
    /// is recorded in every case.
    pub fn ingest(&self, report: Report) -> IngestResult {
        let ctx = IngestContext::new();
        let totals = aggregate(&report.directories);
        match self.ingest_with_context(report, &ctx) {
            Ok(result) => result,
            Err(e) => IngestResult {
                report_id: None,
                outcome: IngestOutcome::Failed(e.to_string()),
                totals,
            },
        }
    }

    /// Ingest a raw request body.
    ///
    /// Malformed bodies are audited under `VALIDATE`/`ERROR` and rejected
    /// before storage is touched.
    pub fn ingest_raw(&self, body: &[u8], ctx: &IngestContext) -> Result<IngestResult, Error> {
        let log_ctx = ctx.log_context();

        let report = match parse_report(body, &log_ctx) {
            Ok(report) => report,
            Err(e) => {
                let host_ip = salvage_host_ip(body).unwrap_or_else(|| UNKNOWN_HOST.to_string());
                let event = AuditEvent::new(
                    &host_ip,
                    ACTION_VALIDATE,
                    STATUS_ERROR,
                    "Rejected malformed report",
                )
                .with_details(format!("{}; sha256={}", e, compute_hash(body)));
                self.recorder.record(&event, &log_ctx.with_host(&host_ip));
                return Err(Error::MalformedInput(e));
            }
        };

        Ok(self.ingest_with_context(report, ctx)?)
    }

    /// Ingest under a caller-supplied context. Storage errors are returned
    /// after they have been audited.
    pub fn ingest_with_context(
        &self,
        report: Report,
        ctx: &IngestContext,
    ) -> Result<IngestResult, StorageError> {
        let log_ctx = ctx.host_context(&report.host_ip);

        let host_lock = self.host_locks.as_ref().map(|l| l.handle(&report.host_ip));
        let _guard = host_lock.as_ref().map(|l| l.lock());

        crate::log_info!(
            log_ctx,
            "REPORT_RECEIVED",
            base_path = report.base_path,
            directories = report.directories.len(),
        );

        screen_report(&report, &log_ctx);
        let totals = aggregate(&report.directories);

        match self.apply(&report, &totals, &log_ctx) {
            Ok(applied) => {
                self.audit_applied(&report, &totals, &applied, &log_ctx);
                crate::log_info!(
                    log_ctx,
                    "REPORT_COMPLETE",
                    outcome = applied.outcome.as_str(),
                    report_id = applied.report_id,
                    total_files = totals.total_files,
                    total_size_mb = totals.total_size_mb,
                );
                Ok(IngestResult {
                    report_id: Some(applied.report_id),
                    outcome: applied.outcome,
                    totals,
                })
            }
            Err(e) => {
                crate::log_error!(log_ctx, "REPORT_FAILED", error = e.to_string());
                let event = AuditEvent::new(
                    &report.host_ip,
                    ACTION_SAVE,
                    STATUS_ERROR,
                    "Failed to save report",
                )
                .with_details(e.to_string());
                self.recorder.record(&event, &log_ctx);
                Err(e)
            }
        }
    }

    /// Read the latest row, decide, and write if needed.
    fn apply(
        &self,
        report: &Report,
        totals: &Totals,
        ctx: &LogContext,
    ) -> Result<Applied, StorageError> {
        let previous = self.reports.latest_report_for(&report.host_ip)?;

        let previous_total_bytes = match &previous {
            Some(prev) => Some(aggregate(&prev.report()?.directories).total_size_bytes),
            None => None,
        };
        let outcome = decide(totals.total_size_bytes, previous_total_bytes);

        log::debug!(
            "{} DEDUP_DECISION outcome={} new_bytes={} previous_bytes={:?}",
            ctx,
            outcome.as_str(),
            totals.total_size_bytes,
            previous_total_bytes
        );

        if let (IngestOutcome::Skipped, Some(prev)) = (&outcome, &previous) {
            return Ok(Applied {
                report_id: prev.id,
                outcome: outcome.clone(),
                previous_total_bytes,
                payload_hash: None,
                failed_directories: 0,
            });
        }

        let payload = report.to_payload()?;
        let payload_hash = compute_hash(payload.as_bytes());
        let report_id = self.reports.insert_report(report, &payload)?;

        let summary = self
            .reports
            .insert_directory_entries(report_id, &report.directories);
        if !summary.is_complete() {
            crate::log_warn!(
                ctx,
                "DIRECTORY_ROWS_PARTIAL",
                report_id = report_id,
                inserted = summary.inserted,
                failed = summary.failed,
            );
        }

        log::info!(
            "{} REPORT_STORED report_id={} sha256={} directory_rows={}",
            ctx,
            report_id,
            payload_hash,
            summary.inserted
        );

        Ok(Applied {
            report_id,
            outcome,
            previous_total_bytes,
            payload_hash: Some(payload_hash),
            failed_directories: summary.failed,
        })
    }

    fn audit_applied(&self, report: &Report, totals: &Totals, applied: &Applied, ctx: &LogContext) {
        let message = match &applied.outcome {
            IngestOutcome::NewHost => format!("New host registered, report {} saved", applied.report_id),
            IngestOutcome::Updated => format!(
                "Report changed ({} -> {} bytes), saved as report {}",
                applied.previous_total_bytes.unwrap_or_default(),
                totals.total_size_bytes,
                applied.report_id
            ),
            IngestOutcome::Skipped => format!(
                "Report unchanged ({} bytes), kept report {}",
                totals.total_size_bytes, applied.report_id
            ),
            IngestOutcome::Failed(reason) => reason.clone(),
        };

        let mut event = AuditEvent::new(
            &report.host_ip,
            applied.outcome.audit_action(),
            applied.outcome.audit_status(),
            &message,
        );
        if let Some(hash) = &applied.payload_hash {
            let mut details = format!(
                "directories={} total_files={} sha256={}",
                report.directories.len(),
                totals.total_files,
                hash
            );
            if applied.failed_directories > 0 {
                details.push_str(&format!(" failed_directory_rows={}", applied.failed_directories));
            }
            event = event.with_details(details);
        }

        self.recorder.record(&event, ctx);
    }
}
