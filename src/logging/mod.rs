//! Logging infrastructure for plangate
//!
//! Structured tracing everywhere, plus a JSONL audit trail of admin actions.

pub mod audit;

pub use audit::{AuditEvent, AuditEventType, AuditLogger};
