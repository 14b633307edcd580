//! Storage module.
//!
//! Persistence for reports, their directory rows and the audit trail.
//! Everything is insert-only: a changed report becomes a new row.

pub mod memory;
pub mod models;
pub mod queries;
pub mod sqlite;
pub mod store;

pub use memory::*;
pub use models::*;
pub use queries::*;
pub use sqlite::*;
pub use store::*;
