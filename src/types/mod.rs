//! Shared types for the reputation ledger

mod error;

pub use error::{LedgerError, Result};
