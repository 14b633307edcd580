//! Security screening for inventory reports.
//!
//! Reports are rendered by the dashboard, so string fields are checked for:
//! - Markup / script injection
//! - Path traversal sequences
//! - Control characters
//! - Oversized fields
//!
//! Detections are logged. The report is never rewritten because the stored
//! payload must stay a faithful copy of what the agent sent.

use lazy_static::lazy_static;
use regex::Regex;

use crate::logging::structured::LogContext;
use crate::model::Report;

/// Size limit for any single string field.
pub const MAX_FIELD_SIZE: usize = 4_096;

lazy_static! {
    /// Markup injection patterns
    static ref MARKUP_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)<script[^>]*>").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)on\w+\s*=").unwrap(),
        Regex::new(r"(?i)<iframe[^>]*>").unwrap(),
    ];

    /// Path traversal patterns
    static ref TRAVERSAL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(^|[\\/])\.\.([\\/]|$)").unwrap(),
        Regex::new(r"[\\/]etc[\\/](passwd|shadow)").unwrap(),
    ];

    /// ASCII control characters other than tab
    static ref CONTROL_PATTERN: Regex = Regex::new(r"[\x00-\x08\x0A-\x1F\x7F]").unwrap();
}

/// Screening detection counts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScreeningResult {
    pub markup_detections: usize,
    pub traversal_detections: usize,
    pub control_detections: usize,
    pub oversized_fields: usize,
}

impl ScreeningResult {
    pub fn total(&self) -> usize {
        self.markup_detections
            + self.traversal_detections
            + self.control_detections
            + self.oversized_fields
    }

    pub fn has_detections(&self) -> bool {
        self.total() > 0
    }
}

/// Scan every string field of a report.
pub fn screen_report(report: &Report, ctx: &LogContext) -> ScreeningResult {
    let mut result = ScreeningResult::default();

    scan_string("host_ip", &report.host_ip, ctx, &mut result);
    scan_string("host_name", &report.host_name, ctx, &mut result);
    scan_string("base_path", &report.base_path, ctx, &mut result);
    scan_string("timestamp", &report.timestamp, ctx, &mut result);
    for dir in &report.directories {
        scan_string("path", &dir.path, ctx, &mut result);
    }

    if result.has_detections() {
        log::warn!(
            "{} SECURITY_DETECTIONS markup={} traversal={} control={} oversized={}",
            ctx,
            result.markup_detections,
            result.traversal_detections,
            result.control_detections,
            result.oversized_fields
        );
    } else {
        log::debug!("{} SCREEN_COMPLETE detections=0", ctx);
    }

    result
}

fn scan_string(field: &str, s: &str, ctx: &LogContext, result: &mut ScreeningResult) {
    if s.len() > MAX_FIELD_SIZE {
        log::debug!(
            "{} SIZE_LIMIT_EXCEEDED field={} size={} limit={}",
            ctx,
            field,
            s.len(),
            MAX_FIELD_SIZE
        );
        result.oversized_fields += 1;
    }

    for pattern in MARKUP_PATTERNS.iter() {
        if pattern.is_match(s) {
            log::debug!(
                "{} PATTERN_DETECTED type=markup field={} pattern={}",
                ctx,
                field,
                pattern.as_str()
            );
            result.markup_detections += 1;
        }
    }

    for pattern in TRAVERSAL_PATTERNS.iter() {
        if pattern.is_match(s) {
            log::debug!(
                "{} PATTERN_DETECTED type=traversal field={} pattern={}",
                ctx,
                field,
                pattern.as_str()
            );
            result.traversal_detections += 1;
        }
    }

    if CONTROL_PATTERN.is_match(s) {
        log::debug!("{} PATTERN_DETECTED type=control field={}", ctx, field);
        result.control_detections += 1;
    }
}
