//! Append-only text audit log.

use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

use crate::model::AuditEvent;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One line per event: `[timestamp] host_ip | action | status | message`.
#[derive(Debug)]
pub struct TextAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TextAuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", event.log_line())?;
        Ok(())
    }
}
