//! Inbound report parsing.
//!
//! Turns a raw request body into a [`Report`] or a [`ValidationError`]
//! before anything touches storage.

use serde_json::Value;
use thiserror::Error;

use crate::logging::structured::LogContext;
use crate::model::Report;

/// Largest request body accepted, in bytes.
pub const MAX_REPORT_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payload of {size} bytes exceeds limit of {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("invalid JSON format: {0}")]
    InvalidJson(String),

    #[error("host_ip is required")]
    MissingHost,
}

/// Parse and check a raw report body.
pub fn parse_report(body: &[u8], ctx: &LogContext) -> Result<Report, ValidationError> {
    if body.len() > MAX_REPORT_SIZE {
        log::warn!(
            "{} REPORT_TOO_LARGE size={} limit={}",
            ctx,
            body.len(),
            MAX_REPORT_SIZE
        );
        return Err(ValidationError::TooLarge {
            size: body.len(),
            limit: MAX_REPORT_SIZE,
        });
    }

    let report: Report = serde_json::from_slice(body).map_err(|e| {
        log::warn!("{} REPORT_PARSE_FAILED error={}", ctx, e);
        ValidationError::InvalidJson(e.to_string())
    })?;

    if report.host_ip.trim().is_empty() {
        log::warn!("{} REPORT_MISSING_HOST", ctx);
        return Err(ValidationError::MissingHost);
    }

    log::debug!(
        "{} REPORT_PARSED host={} directories={}",
        ctx,
        report.host_ip,
        report.directories.len()
    );

    Ok(report)
}

/// Best-effort host id from a body that failed to parse as a report, so the
/// audit row for the failure can still name the sender.
pub fn salvage_host_ip(body: &[u8]) -> Option<String> {
    if body.len() > MAX_REPORT_SIZE {
        return None;
    }
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("host_ip")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
