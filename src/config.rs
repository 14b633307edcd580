//! Service configuration.
//!
//! Values come from `FSREPORT_*` environment variables, falling back to the
//! defaults the agents' deployment scripts assume.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::audit::{AuditRecorder, TextAuditLog};
use crate::pipeline::IngestionEngine;
use crate::query::QueryService;
use crate::storage::{SqliteStore, StorageError};

pub const DEFAULT_PORT: u16 = 5555;
pub const DEFAULT_DB_PATH: &str = "file_reports.db";
pub const DEFAULT_AUDIT_LOG_PATH: &str = "audit.log";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_AUDIT_LIMIT: usize = 100;
pub const DEFAULT_MAX_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub audit_log_path: PathBuf,
    pub history_limit: usize,
    pub audit_limit: usize,
    pub max_limit: usize,
    /// Run read-decide-write for one host under a keyed lock.
    pub serialize_per_host: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            audit_log_path: PathBuf::from(DEFAULT_AUDIT_LOG_PATH),
            history_limit: DEFAULT_HISTORY_LIMIT,
            audit_limit: DEFAULT_AUDIT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            serialize_per_host: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(port) = parse_var(&lookup, "FSREPORT_PORT")? {
            config.port = port;
        }
        if let Some(path) = lookup("FSREPORT_DB_PATH").filter(|v| !v.is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("FSREPORT_AUDIT_LOG").filter(|v| !v.is_empty()) {
            config.audit_log_path = PathBuf::from(path);
        }
        if let Some(limit) = parse_var(&lookup, "FSREPORT_HISTORY_LIMIT")? {
            config.history_limit = limit;
        }
        if let Some(limit) = parse_var(&lookup, "FSREPORT_AUDIT_LIMIT")? {
            config.audit_limit = limit;
        }
        if let Some(flag) = parse_var(&lookup, "FSREPORT_SERIALIZE_PER_HOST")? {
            config.serialize_per_host = flag;
        }

        Ok(config)
    }

    /// Clamp a caller-supplied limit; `None` and zero mean "use the default".
    pub fn resolve_limit(&self, requested: Option<usize>, default: usize) -> usize {
        match requested {
            Some(0) | None => default,
            Some(n) => n.min(self.max_limit),
        }
    }

    /// Open the SQLite store and wire the engine and query service around it.
    pub fn open_service(&self) -> Result<(IngestionEngine, QueryService), StorageError> {
        let store = Arc::new(SqliteStore::open(&self.db_path)?);
        let recorder = AuditRecorder::new(store.clone(), TextAuditLog::new(&self.audit_log_path));

        log::info!(
            "SERVICE_OPENED db_path={} audit_log={} port={}",
            self.db_path.display(),
            self.audit_log_path.display(),
            self.port
        );

        let engine = IngestionEngine::new(store.clone(), recorder)
            .with_per_host_serialization(self.serialize_per_host);
        let queries = QueryService::new(store.clone(), store, self.clone());
        Ok((engine, queries))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}
