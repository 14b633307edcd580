//! Ingestion outcomes.
//!
//! Maps each outcome onto the audit vocabulary.

use crate::aggregation::Totals;
use crate::model::{
    ACTION_RECEIVE, ACTION_SAVE, ACTION_UPDATE, STATUS_ERROR, STATUS_NEW_HOST, STATUS_SKIPPED,
    STATUS_SUCCESS,
};

/// What ingestion did with a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// First report ever seen for the host.
    NewHost,
    /// Total size differs from the host's latest report; stored as a new row.
    Updated,
    /// Total size equals the latest report's; nothing written.
    Skipped,
    /// Storage or payload error; nothing was written. Carries the reason.
    Failed(String),
}

impl IngestOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            IngestOutcome::NewHost => "new_host",
            IngestOutcome::Updated => "updated",
            IngestOutcome::Skipped => "skipped",
            IngestOutcome::Failed(_) => "failed",
        }
    }

    pub fn audit_action(&self) -> &'static str {
        match self {
            IngestOutcome::NewHost => ACTION_SAVE,
            IngestOutcome::Updated => ACTION_UPDATE,
            IngestOutcome::Skipped => ACTION_RECEIVE,
            IngestOutcome::Failed(_) => ACTION_SAVE,
        }
    }

    pub fn audit_status(&self) -> &'static str {
        match self {
            IngestOutcome::NewHost => STATUS_NEW_HOST,
            IngestOutcome::Updated => STATUS_SUCCESS,
            IngestOutcome::Skipped => STATUS_SKIPPED,
            IngestOutcome::Failed(_) => STATUS_ERROR,
        }
    }

    /// Whether a new report row was written.
    pub fn stored(&self) -> bool {
        matches!(self, IngestOutcome::NewHost | IngestOutcome::Updated)
    }
}

/// Result of one ingestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResult {
    /// New row id, or the existing row's id when skipped. `None` on failure.
    pub report_id: Option<i64>,
    pub outcome: IngestOutcome,
    pub totals: Totals,
}

/// Decide from the new total and the latest stored total (if any).
///
/// Only the byte total is compared; a report whose directories changed but
/// whose total size did not is treated as unchanged.
pub fn decide(new_total_bytes: u64, previous_total_bytes: Option<u64>) -> IngestOutcome {
    match previous_total_bytes {
        None => IngestOutcome::NewHost,
        Some(prev) if prev == new_total_bytes => IngestOutcome::Skipped,
        Some(_) => IngestOutcome::Updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide() {
        assert_eq!(decide(10, None), IngestOutcome::NewHost);
        assert_eq!(decide(10, Some(10)), IngestOutcome::Skipped);
        assert_eq!(decide(10, Some(11)), IngestOutcome::Updated);
        assert_eq!(decide(0, Some(0)), IngestOutcome::Skipped);
    }

    #[test]
    fn test_audit_mapping() {
        assert_eq!(IngestOutcome::NewHost.audit_status(), "NEW_HOST");
        assert_eq!(IngestOutcome::Updated.audit_action(), "UPDATE");
        assert_eq!(IngestOutcome::Skipped.audit_status(), "SKIPPED");
        assert_eq!(IngestOutcome::Failed("x".into()).audit_status(), "ERROR");
        assert!(IngestOutcome::Updated.stored());
        assert!(!IngestOutcome::Skipped.stored());
    }
}
