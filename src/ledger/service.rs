//! Action Ledger
//!
//! Owns the collection of submitted actions and drives each one through
//! `pending -> approved | rejected`, with an administrative reset back to
//! `pending`.
//!
//! Every write is a compare-and-swap against the exact bytes that were read,
//! so two reviewers racing on one action cannot both win. Authorization and
//! point validation happen before anything is written.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::action::{
    Action, ActionStatus, FinalizeOutcome, RejectOutcome, RewardPayload, UNKNOWN_EVENT_NAME,
};
use crate::auth::{AuthorityScope, AuthorizationGuard};
use crate::custodial_keys::WalletResolver;
use crate::db::{self, KvStore, ACTION_PREFIX, ACTION_SEQUENCE_KEY};
use crate::identity::Identity;
use crate::logging::{AuditEvent, AuditKind, AuditLog};
use crate::registry::Registry;
use crate::types::{LedgerError, Result};

fn record_key(action_id: &str) -> String {
    format!("{}{}", ACTION_PREFIX, action_id)
}

/// The action ledger service
pub struct ActionLedger {
    store: Arc<dyn KvStore>,
    registry: Arc<Registry>,
    resolver: Arc<WalletResolver>,
    guard: AuthorizationGuard,
    audit: AuditLog,
}

impl ActionLedger {
    pub fn new(
        store: Arc<dyn KvStore>,
        registry: Arc<Registry>,
        resolver: Arc<WalletResolver>,
        admin_identity: Option<String>,
    ) -> Self {
        let guard = AuthorizationGuard::new(Arc::clone(&registry), admin_identity);
        Self {
            store,
            registry,
            resolver,
            guard,
            audit: AuditLog::new(),
        }
    }

    /// Use `audit` for transition records instead of a tracing-only log
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn resolver(&self) -> &WalletResolver {
        &self.resolver
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Record a new `pending` action.
    ///
    /// An unregistered event id is accepted and snapshotted as "Unknown".
    /// If the submitter cannot be resolved nothing is written.
    pub async fn submit(
        &self,
        submitter: &Identity,
        event_id: &str,
        action_key: Option<&str>,
    ) -> Result<Action> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(LedgerError::BadRequest("eventId is required".into()));
        }

        let wallet = self.resolver.resolve(submitter).await?;
        let event_name_snapshot = self
            .registry
            .events
            .get(event_id)
            .map(|event| event.name.clone())
            .unwrap_or_else(|| UNKNOWN_EVENT_NAME.to_string());

        let sequence = self.store.increment(ACTION_SEQUENCE_KEY).await?;
        let now = Utc::now();
        let action = Action {
            id: Uuid::new_v4().to_string(),
            sequence,
            submitter_wallet: wallet,
            submitter_display: submitter.display(),
            event_id: event_id.to_string(),
            event_name_snapshot,
            action_key: action_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            status: ActionStatus::Pending,
            submitted_at: now,
            updated_at: now,
            final_data: None,
            revision: 0,
            history: Vec::new(),
        };

        let key = record_key(&action.id);
        if self
            .store
            .insert_if_absent(&key, db::encode(&action)?)
            .await?
            .is_some()
        {
            return Err(LedgerError::Internal(format!(
                "Action id collision: {}",
                action.id
            )));
        }

        self.audit.record(AuditEvent::new(
            AuditKind::Submitted,
            &action.id,
            action.submitter_wallet.as_str(),
            ActionStatus::Pending,
        ));

        Ok(action)
    }

    /// Compute the reward payload for approving a pending action.
    ///
    /// Read-only: the stored record is untouched whatever the outcome.
    pub async fn prepare_approval(
        &self,
        caller: &str,
        action_id: &str,
        action_kind: &str,
        requested_bonus: i64,
    ) -> Result<RewardPayload> {
        let (action, _) = self.load(action_id).await?;
        self.guard
            .authorize(caller, AuthorityScope::EventOrganizer(&action.event_id))?;

        if action.status != ActionStatus::Pending {
            return Err(LedgerError::InvalidTransition {
                from: action.status,
                to: ActionStatus::Approved,
            });
        }

        let points = self
            .registry
            .schema
            .compute_points(action_kind, requested_bonus)?;

        debug!(
            action_id = %action.id,
            action_key = %action_kind,
            base = points.base,
            bonus = points.bonus,
            "Prepared approval payload"
        );

        Ok(RewardPayload {
            community_id: self.registry.schema.community_id().to_string(),
            schema_id: self.registry.schema.schema_id().to_string(),
            action_id: action.id,
            action_key: action_kind.to_string(),
            base_points: points.base,
            bonus_points: points.bonus,
            recipient_wallet: action.submitter_wallet,
        })
    }

    /// Mark an action approved, attaching the minting receipt.
    ///
    /// Repeating a finalize with the same receipt is a no-op; a different
    /// receipt for an approved action is a conflict. A `null` receipt is
    /// refused since it cannot be told apart from no receipt once stored.
    pub async fn finalize(
        &self,
        caller: &str,
        action_id: &str,
        receipt: serde_json::Value,
    ) -> Result<(Action, FinalizeOutcome)> {
        if receipt.is_null() {
            return Err(LedgerError::BadRequest("receipt is required".into()));
        }

        let (mut action, raw) = self.load(action_id).await?;
        let authorized = self
            .guard
            .authorize(caller, AuthorityScope::EventOrganizer(&action.event_id))?;

        match action.status {
            ActionStatus::Pending => {}
            ActionStatus::Approved => {
                if action.final_data.as_ref() == Some(&receipt) {
                    debug!(action_id = %action.id, "Finalize repeated with same receipt");
                    return Ok((action, FinalizeOutcome::AlreadyFinalized));
                }
                return Err(LedgerError::Conflict(format!(
                    "Action {} is already finalized with a different receipt",
                    action.id
                )));
            }
            ActionStatus::Rejected => {
                return Err(LedgerError::InvalidTransition {
                    from: ActionStatus::Rejected,
                    to: ActionStatus::Approved,
                });
            }
        }

        action.transition(ActionStatus::Approved, &authorized.caller, false);
        action.final_data = Some(receipt);
        self.commit(&raw, &action).await?;

        self.audit.record(
            AuditEvent::new(
                AuditKind::Finalized,
                &action.id,
                &authorized.caller,
                ActionStatus::Approved,
            )
            .with_from(ActionStatus::Pending),
        );

        Ok((action, FinalizeOutcome::Finalized))
    }

    /// Reject a pending action. Rejecting twice is a no-op.
    pub async fn reject(&self, caller: &str, action_id: &str) -> Result<(Action, RejectOutcome)> {
        let (mut action, raw) = self.load(action_id).await?;
        let authorized = self
            .guard
            .authorize(caller, AuthorityScope::EventOrganizer(&action.event_id))?;

        match action.status {
            ActionStatus::Pending => {}
            ActionStatus::Rejected => return Ok((action, RejectOutcome::AlreadyRejected)),
            ActionStatus::Approved => {
                return Err(LedgerError::InvalidTransition {
                    from: ActionStatus::Approved,
                    to: ActionStatus::Rejected,
                });
            }
        }

        action.transition(ActionStatus::Rejected, &authorized.caller, false);
        self.commit(&raw, &action).await?;

        self.audit.record(
            AuditEvent::new(
                AuditKind::Rejected,
                &action.id,
                &authorized.caller,
                ActionStatus::Rejected,
            )
            .with_from(ActionStatus::Pending),
        );

        Ok((action, RejectOutcome::Rejected))
    }

    /// Administrative reset to `pending` from any state.
    ///
    /// A recorded receipt is moved into the history entry.
    pub async fn reset(&self, admin: &str, action_id: &str) -> Result<Action> {
        let authorized = self.guard.authorize(admin, AuthorityScope::GlobalAdmin)?;
        let (mut action, raw) = self.load(action_id).await?;

        let from = action.status;
        let cleared = action.final_data.clone();
        action.transition(ActionStatus::Pending, &authorized.caller, true);
        self.commit(&raw, &action).await?;

        let mut event = AuditEvent::new(
            AuditKind::Reset,
            &action.id,
            &authorized.caller,
            ActionStatus::Pending,
        )
        .with_from(from);
        if let Some(receipt) = cleared {
            event = event.with_metadata(serde_json::json!({ "previousFinalData": receipt }));
        }
        self.audit.record(event);

        Ok(action)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Fetch one action
    pub async fn get(&self, action_id: &str) -> Result<Action> {
        self.load(action_id).await.map(|(action, _)| action)
    }

    /// All actions in submission order
    pub async fn list_all(&self) -> Result<Vec<Action>> {
        let mut actions = self
            .store
            .scan_prefix(ACTION_PREFIX)
            .await?
            .into_iter()
            .map(|(_, bytes)| db::decode::<Action>(&bytes))
            .collect::<Result<Vec<_>>>()?;
        actions.sort_by_key(|action| action.sequence);
        Ok(actions)
    }

    /// Actions awaiting review, in submission order
    pub async fn list_pending(&self) -> Result<Vec<Action>> {
        let mut actions = self.list_all().await?;
        actions.retain(|action| action.status == ActionStatus::Pending);
        Ok(actions)
    }

    /// Actions whose reward goes to `identity`, in submission order.
    ///
    /// An email that has never been resolved has no wallet and so no actions;
    /// looking it up does not create one.
    pub async fn list_by_recipient(&self, identity: &Identity) -> Result<Vec<Action>> {
        let Some(wallet) = self.resolver.lookup(identity).await? else {
            return Ok(Vec::new());
        };
        let mut actions = self.list_all().await?;
        actions.retain(|action| action.submitter_wallet == wallet);
        Ok(actions)
    }

    // =========================================================================
    // Storage helpers
    // =========================================================================

    async fn load(&self, action_id: &str) -> Result<(Action, Vec<u8>)> {
        let raw = self
            .store
            .get(&record_key(action_id))
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Action {}", action_id)))?;
        let action = db::decode(&raw)?;
        Ok((action, raw))
    }

    async fn commit(&self, expected: &[u8], action: &Action) -> Result<()> {
        let swapped = self
            .store
            .compare_and_swap(&record_key(&action.id), Some(expected), db::encode(action)?)
            .await?;
        if !swapped {
            info!(action_id = %action.id, "Lost transition race");
            return Err(LedgerError::Conflict(format!(
                "Action {} was modified concurrently",
                action.id
            )));
        }
        Ok(())
    }
}
