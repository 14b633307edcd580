//! Inventory report shapes as submitted by remote agents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One directory line of an inventory report.
///
/// `size_bytes` is authoritative. `size_mb` is the sender's own rounding and
/// is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub path: String,
    pub file_count: u64,
    pub size_bytes: u64,
    #[serde(default)]
    pub size_mb: i64,
}

impl DirectoryEntry {
    pub fn new(path: &str, file_count: u64, size_bytes: u64) -> Self {
        Self {
            path: path.to_string(),
            file_count,
            size_bytes,
            size_mb: (size_bytes / crate::aggregation::BYTES_PER_MB) as i64,
        }
    }
}

/// A per-host directory inventory snapshot.
///
/// `timestamp` and `total_directories` are sender-declared and never checked
/// against the directory list. Agents may send the directory count at the top
/// level or inside a `totals` block; see [`Report::declared_total_directories`].
/// Fields this model does not know about are kept in `extra` so the serialized
/// payload stays a faithful copy of the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub host_ip: String,
    #[serde(default)]
    pub host_name: String,
    #[serde(default)]
    pub base_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_directories: Option<i64>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub directories: Vec<DirectoryEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Report {
    pub fn new(host_ip: &str, base_path: &str, directories: Vec<DirectoryEntry>) -> Self {
        Self {
            host_ip: host_ip.to_string(),
            host_name: String::new(),
            base_path: base_path.to_string(),
            total_directories: Some(directories.len() as i64),
            timestamp: String::new(),
            directories,
            extra: Map::new(),
        }
    }

    pub fn with_host_name(mut self, host_name: &str) -> Self {
        self.host_name = host_name.to_string();
        self
    }

    pub fn with_timestamp(mut self, timestamp: &str) -> Self {
        self.timestamp = timestamp.to_string();
        self
    }

    /// Sender's directory count: the top-level field, else `totals.total_directories`,
    /// else 0.
    pub fn declared_total_directories(&self) -> i64 {
        self.total_directories
            .or_else(|| {
                self.extra
                    .get("totals")
                    .and_then(|t| t.get("total_directories"))
                    .and_then(Value::as_i64)
            })
            .unwrap_or(0)
    }

    /// Serialize for verbatim storage.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}
