//! Audit trail for ledger transitions
//!
//! Every committed transition is emitted as a structured `tracing` event on
//! the `audit` target and, when a path is configured, appended as a JSONL
//! line. Resets are logged at `warn` since they undo a terminal decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::ledger::ActionStatus;

/// Audit event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Submitted,
    Finalized,
    Rejected,
    Reset,
}

/// One committed ledger transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: AuditKind,
    pub action_id: String,
    /// Who caused the transition (submitter wallet, organizer or admin)
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ActionStatus>,
    pub to: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(kind: AuditKind, action_id: impl Into<String>, actor: impl Into<String>, to: ActionStatus) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            action_id: action_id.into(),
            actor: actor.into(),
            from: None,
            to,
            metadata: None,
        }
    }

    /// Set the status the action left
    pub fn with_from(mut self, from: ActionStatus) -> Self {
        self.from = Some(from);
        self
    }

    /// Attach extra detail
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Audit logger that writes to tracing and optionally a JSONL file
#[derive(Clone, Default)]
pub struct AuditLog {
    writer: Arc<Mutex<Option<BufWriter<File>>>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also append events to the JSONL file at `path`
    pub fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        *self.lock_writer() = Some(BufWriter::new(file));
        info!("Audit log initialized to {}", path.display());
        Ok(())
    }

    /// Recovers the writer from a poisoned lock
    fn lock_writer(&self) -> MutexGuard<'_, Option<BufWriter<File>>> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a committed transition
    ///
    /// Blocking file I/O; the writer lock is released before returning.
    pub fn record(&self, event: AuditEvent) {
        let from = event.from.map(|s| s.to_string());
        match event.kind {
            AuditKind::Reset => warn!(
                target: "audit",
                action_id = %event.action_id,
                actor = %event.actor,
                from = ?from,
                to = %event.to,
                "Action reset by administrator"
            ),
            kind => info!(
                target: "audit",
                action_id = %event.action_id,
                actor = %event.actor,
                from = ?from,
                to = %event.to,
                kind = ?kind,
                "Action transition"
            ),
        }

        let mut writer = self.lock_writer();
        if let Some(ref mut writer) = *writer {
            let line = match event.to_jsonl() {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to serialize audit event: {}", e);
                    return;
                }
            };
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                error!("Failed to write audit event: {}", e);
            }
        }
    }
}
