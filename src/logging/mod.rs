//! Structured logging with request context.
//!
//! Provides logging macros and utilities that include request_id and host_ip
//! in every log message for easy correlation.

pub mod structured;

pub use structured::*;
