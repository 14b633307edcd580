//! Transport boundary.
//!
//! Each function takes what an HTTP handler has in hand (raw body, query
//! string values) and returns a status code plus a JSON body. Routing, CORS
//! and static pages live outside this crate.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::pipeline::{IngestContext, IngestOutcome, IngestionEngine};
use crate::query::{AuditLogQuery, QueryService};
use crate::validation::ValidationError;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// A finished response for the transport layer to write out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiReply {
    fn json<T: Serialize>(status_code: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status_code,
                content_type: CONTENT_TYPE_JSON,
                body,
            },
            Err(e) => {
                log::error!("RESPONSE_ENCODE_FAILED error={}", e);
                Self::raw(500, r#"{"error":"response encoding failed"}"#.to_string())
            }
        }
    }

    fn raw(status_code: u16, body: String) -> Self {
        Self {
            status_code,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    fn error(err: &Error) -> Self {
        Self::json(
            err.status_code(),
            &ErrorBody {
                error: err.to_string(),
                kind: err.kind().to_string(),
            },
        )
    }
}

/// Body of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: String,
    pub report_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub time: String,
    pub database: String,
}

/// Handle an agent's report submission.
pub fn submit(engine: &IngestionEngine, body: &[u8], request_id: Option<&str>) -> ApiReply {
    let ctx = match request_id {
        Some(id) if !id.is_empty() => IngestContext::with_request_id(id),
        _ => IngestContext::new(),
    };

    let result = match engine.ingest_raw(body, &ctx) {
        Ok(result) => result,
        Err(e) => return ApiReply::error(&e),
    };

    // Failures surface as `Err` above; a stored or kept report always has an id.
    let Some(report_id) = result.report_id else {
        return ApiReply::json(
            500,
            &ErrorBody {
                error: "Failed to save report".to_string(),
                kind: "storage_failure".to_string(),
            },
        );
    };

    let (status, message) = match result.outcome {
        IngestOutcome::Skipped => ("skipped", "File report unchanged, not stored"),
        IngestOutcome::Updated => ("success", "File report updated"),
        _ => ("success", "New host registered, file report saved"),
    };

    ApiReply::json(
        200,
        &SubmitResponse {
            status: status.to_string(),
            report_id,
            message: message.to_string(),
        },
    )
}

/// Host list for the dashboard.
pub fn hosts(queries: &QueryService) -> ApiReply {
    match queries.host_summaries() {
        Ok(hosts) => ApiReply::json(200, &hosts),
        Err(e) => ApiReply::error(&e),
    }
}

/// History of one host; `ip` is required, `limit` optional.
pub fn host_reports(queries: &QueryService, ip: Option<&str>, limit: Option<&str>) -> ApiReply {
    let Some(ip) = ip.filter(|v| !v.trim().is_empty()) else {
        return ApiReply::error(&Error::MalformedInput(ValidationError::MissingHost));
    };
    let limit = match parse_limit(limit) {
        Ok(limit) => limit,
        Err(e) => return ApiReply::error(&e),
    };

    match queries.host_history(ip, limit) {
        Ok(history) => ApiReply::json(200, &history),
        Err(e) => ApiReply::error(&e),
    }
}

/// Verbatim stored payload for one report id.
pub fn report_details(queries: &QueryService, id: Option<&str>) -> ApiReply {
    let id = match id.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(id)) => id,
        Some(Err(_)) | None => {
            return ApiReply::error(&Error::MalformedInput(ValidationError::InvalidJson(
                "id parameter must be an integer".to_string(),
            )))
        }
    };

    match queries.report_detail(id) {
        Ok(payload) => ApiReply::raw(200, payload),
        Err(e) => ApiReply::error(&e),
    }
}

/// Audit viewer rows, filterable by action and host.
pub fn audit_logs(
    queries: &QueryService,
    action: Option<&str>,
    host_ip: Option<&str>,
    limit: Option<&str>,
) -> ApiReply {
    let limit = match parse_limit(limit) {
        Ok(limit) => limit,
        Err(e) => return ApiReply::error(&e),
    };
    let query = AuditLogQuery {
        action: action.map(str::to_string),
        host_ip: host_ip.map(str::to_string),
        limit,
    };

    match queries.audit_log(&query) {
        Ok(rows) => ApiReply::json(200, &rows),
        Err(e) => ApiReply::error(&e),
    }
}

/// Liveness plus a database ping. Always 200; the body says whether the
/// database answered.
pub fn health(queries: &QueryService) -> ApiReply {
    let database = match queries.ping() {
        Ok(()) => "healthy".to_string(),
        Err(e) => format!("unhealthy: {e}"),
    };

    ApiReply::json(
        200,
        &HealthResponse {
            status: "healthy".to_string(),
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            database,
        },
    )
}

fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, Error> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse::<usize>().map(Some).map_err(|_| {
            Error::MalformedInput(ValidationError::InvalidJson(format!(
                "limit must be a non-negative integer, got {v:?}"
            )))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::audit::AuditRecorder;
    use crate::config::Config;
    use crate::storage::MemoryStore;

    fn setup() -> (IngestionEngine, QueryService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = IngestionEngine::new(store.clone(), AuditRecorder::without_text_log(store.clone()));
        let queries = QueryService::new(store.clone(), store.clone(), Config::default());
        (engine, queries, store)
    }

    const BODY: &[u8] = br#"{
        "host_ip": "10.0.0.5",
        "host_name": "fs-01",
        "base_path": "/data",
        "total_directories": 1,
        "timestamp": "2026-01-29 10:00:00",
        "directories": [{"path": "/data/a", "file_count": 10, "size_bytes": 1048576, "size_mb": 1}]
    }"#;

    #[test]
    fn test_submit_then_skip() {
        let (engine, _queries, _store) = setup();

        let first = submit(&engine, BODY, Some("req-given"));
        assert_eq!(first.status_code, 200);
        let first: SubmitResponse = serde_json::from_str(&first.body).unwrap();
        assert_eq!(first.status, "success");

        let second = submit(&engine, BODY, None);
        let second: SubmitResponse = serde_json::from_str(&second.body).unwrap();
        assert_eq!(second.status, "skipped");
        assert_eq!(second.report_id, first.report_id);

        let changed = String::from_utf8_lossy(BODY).replace("1048576", "2097152");
        let third: SubmitResponse =
            serde_json::from_str(&submit(&engine, changed.as_bytes(), None).body).unwrap();
        assert_eq!(third.status, "success");
        assert_eq!(third.message, "File report updated");
        assert!(third.report_id > first.report_id);
    }

    #[test]
    fn test_submit_malformed() {
        let (engine, _queries, store) = setup();
        let reply = submit(&engine, b"{oops", None);
        assert_eq!(reply.status_code, 400);
        assert_eq!(store.audit_count(), 1);

        let body: ErrorBody = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body.kind, "malformed_input");
    }

    #[test]
    fn test_submit_storage_failure() {
        let (engine, _queries, store) = setup();
        store.set_available(false);
        let reply = submit(&engine, BODY, None);
        assert_eq!(reply.status_code, 500);
    }

    #[test]
    fn test_query_endpoints() {
        let (engine, queries, _store) = setup();
        let stored: SubmitResponse =
            serde_json::from_str(&submit(&engine, BODY, None).body).unwrap();

        let hosts_reply = hosts(&queries);
        assert_eq!(hosts_reply.status_code, 200);
        let hosts_json: serde_json::Value = serde_json::from_str(&hosts_reply.body).unwrap();
        assert_eq!(hosts_json[0]["host_ip"], "10.0.0.5");
        assert_eq!(hosts_json[0]["total_size_mb"], 1);
        assert_eq!(hosts_json[0]["report_count"], 1);

        let history = host_reports(&queries, Some("10.0.0.5"), Some("5"));
        let history_json: serde_json::Value = serde_json::from_str(&history.body).unwrap();
        assert_eq!(history_json[0]["id"], stored.report_id);
        assert_eq!(history_json[0]["directories"][0]["path"], "/data/a");

        assert_eq!(host_reports(&queries, None, None).status_code, 400);
        assert_eq!(host_reports(&queries, Some("10.0.0.5"), Some("x")).status_code, 400);
        assert_eq!(host_reports(&queries, Some("10.9.9.9"), None).status_code, 404);

        let detail = report_details(&queries, Some(&stored.report_id.to_string()));
        assert_eq!(detail.status_code, 200);
        let detail_json: serde_json::Value = serde_json::from_str(&detail.body).unwrap();
        assert_eq!(detail_json["host_name"], "fs-01");
        assert_eq!(report_details(&queries, Some("999")).status_code, 404);
        assert_eq!(report_details(&queries, Some("abc")).status_code, 400);

        let audit = audit_logs(&queries, Some("SAVE"), None, None);
        let audit_json: serde_json::Value = serde_json::from_str(&audit.body).unwrap();
        assert_eq!(audit_json.as_array().unwrap().len(), 1);
        assert_eq!(audit_json[0]["status"], "NEW_HOST");
    }

    #[test]
    fn test_health() {
        let (_engine, queries, store) = setup();
        let reply = health(&queries);
        let body: HealthResponse = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body.database, "healthy");

        store.set_available(false);
        let body: HealthResponse = serde_json::from_str(&health(&queries).body).unwrap();
        assert!(body.database.starts_with("unhealthy"));
    }
}
