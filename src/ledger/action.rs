//! Action records and the payloads derived from them

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::WalletAddress;

/// Event name recorded for submissions against an unregistered event id
pub const UNKNOWN_EVENT_NAME: &str = "Unknown";

/// Lifecycle status of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Approved,
    Rejected,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in an action's append-only transition history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub from: ActionStatus,
    pub to: ActionStatus,
    pub actor: String,
    pub at: DateTime<Utc>,
    /// Receipt that was cleared by a reset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_final_data: Option<serde_json::Value>,
}

/// A submitted claim of a rewardable activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    /// Submission order
    pub sequence: u64,
    pub submitter_wallet: WalletAddress,
    /// Email of the submitter, or the direct wallet marker
    pub submitter_display: String,
    pub event_id: String,
    pub event_name_snapshot: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_key: Option<String>,
    pub status: ActionStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_data: Option<serde_json::Value>,
    /// Incremented on every write
    pub revision: u64,
    #[serde(default)]
    pub history: Vec<TransitionRecord>,
}

impl Action {
    /// Move to `to` and append a history entry. With `clear_final_data` the
    /// stored receipt moves into that entry.
    pub(crate) fn transition(&mut self, to: ActionStatus, actor: &str, clear_final_data: bool) {
        let now = Utc::now();
        let previous_final_data = if clear_final_data {
            self.final_data.take()
        } else {
            None
        };
        self.history.push(TransitionRecord {
            from: self.status,
            to,
            actor: actor.to_string(),
            at: now,
            previous_final_data,
        });
        self.status = to;
        self.updated_at = now;
        self.revision += 1;
    }
}

/// Everything an external minter needs to write one reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardPayload {
    pub community_id: String,
    pub schema_id: String,
    pub action_id: String,
    pub action_key: String,
    pub base_points: u32,
    pub bonus_points: u32,
    pub recipient_wallet: WalletAddress,
}

/// Result of a finalize call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeOutcome {
    Finalized,
    /// The same receipt was already recorded
    AlreadyFinalized,
}

/// Result of a reject call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectOutcome {
    Rejected,
    AlreadyRejected,
}
