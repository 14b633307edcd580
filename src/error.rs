//! Error taxonomy.
//!
//! Partial directory-row failures and audit-sink failures never show up
//! here: they are logged where they happen and the request carries on.

use thiserror::Error;

use crate::storage::StorageError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
    /// The payload could not be turned into a report.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] ValidationError),

    /// Unknown host or report id.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Status code the transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MalformedInput(_) => 400,
            Error::NotFound(_) => 404,
            Error::Storage(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedInput(_) => "malformed_input",
            Error::NotFound(_) => "not_found",
            Error::Storage(_) => "storage_failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
