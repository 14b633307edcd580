//! Report totals.
//!
//! Totals are never stored: ingestion, host summaries and history all call
//! [`aggregate`] on the directory list they have in hand.

use serde::{Deserialize, Serialize};

use crate::model::DirectoryEntry;

pub const BYTES_PER_MB: u64 = 1_048_576;
pub const BYTES_PER_GB: u64 = 1_073_741_824;

/// Aggregated view of a directory list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_files: u64,
    pub total_size_bytes: u64,
    pub total_size_mb: u64,
    pub total_size_gb: u64,
}

/// Sum file counts and sizes. MB and GB are truncating divisions of the byte total.
pub fn aggregate(directories: &[DirectoryEntry]) -> Totals {
    let (total_files, total_size_bytes) =
        directories.iter().fold((0u64, 0u64), |(files, bytes), dir| {
            (
                files.saturating_add(dir.file_count),
                bytes.saturating_add(dir.size_bytes),
            )
        });

    Totals {
        total_files,
        total_size_bytes,
        total_size_mb: total_size_bytes / BYTES_PER_MB,
        total_size_gb: total_size_bytes / BYTES_PER_GB,
    }
}
