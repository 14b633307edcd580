//! SQL text for the SQLite store.

/// Schema for reports, their directory rows and the audit trail.
pub const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS file_reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        host_ip TEXT NOT NULL,
        host_name TEXT NOT NULL DEFAULT '',
        base_path TEXT NOT NULL DEFAULT '',
        total_directories INTEGER NOT NULL DEFAULT 0,
        report_data TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_reports_host_ip ON file_reports(host_ip);
    CREATE INDEX IF NOT EXISTS idx_reports_created_at ON file_reports(created_at);
    CREATE INDEX IF NOT EXISTS idx_reports_host_created ON file_reports(host_ip, created_at);

    CREATE TABLE IF NOT EXISTS directory_details (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        report_id INTEGER NOT NULL REFERENCES file_reports(id) ON DELETE CASCADE,
        path TEXT NOT NULL,
        file_count INTEGER NOT NULL,
        size_bytes INTEGER NOT NULL,
        size_mb INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_directory_details_report ON directory_details(report_id);

    CREATE TABLE IF NOT EXISTS audit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        host_ip TEXT NOT NULL,
        action TEXT NOT NULL,
        status TEXT NOT NULL,
        message TEXT NOT NULL,
        details TEXT,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_audit_host_ip ON audit_logs(host_ip);
    CREATE INDEX IF NOT EXISTS idx_audit_action ON audit_logs(action);
    CREATE INDEX IF NOT EXISTS idx_audit_created_at ON audit_logs(created_at);
"#;

/// Columns read for every `StoredReport`, in `row_to_report` order.
const REPORT_COLUMNS: &str =
    "id, host_ip, host_name, base_path, total_directories, created_at, report_data";

pub fn build_report_insert() -> &'static str {
    r#"
    INSERT INTO file_reports
        (host_ip, host_name, base_path, total_directories, report_data, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#
}

pub fn build_directory_insert() -> &'static str {
    r#"
    INSERT INTO directory_details
        (report_id, path, file_count, size_bytes, size_mb)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#
}

pub fn build_audit_insert() -> &'static str {
    r#"
    INSERT INTO audit_logs
        (host_ip, action, status, message, details, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#
}

/// Latest report for `?1`: newest `created_at`, ties broken by the larger id.
pub fn build_latest_for_host() -> String {
    format!(
        "SELECT {REPORT_COLUMNS} FROM file_reports \
         WHERE host_ip = ?1 \
         ORDER BY created_at DESC, id DESC LIMIT 1"
    )
}

/// One row per host, each the latest for its host, newest host first.
pub fn build_latest_per_host() -> String {
    format!(
        "SELECT {REPORT_COLUMNS} FROM file_reports r \
         WHERE r.id = ( \
             SELECT r2.id FROM file_reports r2 \
             WHERE r2.host_ip = r.host_ip \
             ORDER BY r2.created_at DESC, r2.id DESC LIMIT 1 \
         ) \
         ORDER BY r.created_at DESC, r.id DESC"
    )
}

pub fn build_reports_for_host() -> String {
    format!(
        "SELECT {REPORT_COLUMNS} FROM file_reports \
         WHERE host_ip = ?1 \
         ORDER BY created_at DESC, id DESC LIMIT ?2"
    )
}

pub fn build_report_by_id() -> String {
    format!("SELECT {REPORT_COLUMNS} FROM file_reports WHERE id = ?1")
}

pub fn build_count_for_host() -> &'static str {
    "SELECT COUNT(*) FROM file_reports WHERE host_ip = ?1"
}

pub fn build_directories_for_report() -> &'static str {
    "SELECT path, file_count, size_bytes, size_mb FROM directory_details \
     WHERE report_id = ?1 ORDER BY id ASC"
}

/// Audit read with optional action / host filters.
///
/// Placeholders are numbered in the order action, host, limit, skipping
/// filters that are absent.
pub fn build_audit_select(filter_action: bool, filter_host: bool) -> String {
    let mut clauses = Vec::new();
    let mut next = 1;

    if filter_action {
        clauses.push(format!("action = ?{next}"));
        next += 1;
    }
    if filter_host {
        clauses.push(format!("host_ip = ?{next}"));
        next += 1;
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    format!(
        "SELECT id, host_ip, action, status, message, details, created_at \
         FROM audit_logs{where_clause} \
         ORDER BY created_at DESC, id DESC LIMIT ?{next}"
    )
}
