//! Security module.
//!
//! Screens submitted reports for content the dashboard should not trust and
//! fingerprints payloads for the audit trail.

pub mod digest;
pub mod sanitizer;

pub use digest::*;
pub use sanitizer::*;
