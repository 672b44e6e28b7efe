//! Logging
//!
//! Structured audit records for ledger transitions.

pub mod audit;

pub use audit::{AuditEvent, AuditKind, AuditLog};
