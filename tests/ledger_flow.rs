//! End-to-end ledger scenarios against the sled store
//!
//! Each test opens its own database in a temporary directory.

use std::sync::Arc;

use reputation_ledger::custodial_keys::{LocalEncryptedCustody, WalletResolver};
use reputation_ledger::db::{KvStore, SledStore};
use reputation_ledger::identity::Identity;
use reputation_ledger::ledger::{ActionStatus, FinalizeOutcome};
use reputation_ledger::registry::Registry;
use reputation_ledger::{ActionLedger, LedgerError};
use serde_json::json;
use tempfile::TempDir;

const ORGANIZER: &str = "0xCB7823F557E49fd23C70C27fa7739D8e695561B6";
const ADMIN: &str = "steward@example.com";

fn open_ledger(dir: &TempDir) -> (ActionLedger, Arc<SledStore>) {
    let store = Arc::new(SledStore::open(dir.path().join("ledger.sled")).unwrap());
    let resolver = Arc::new(WalletResolver::new(
        store.clone(),
        Arc::new(LocalEncryptedCustody::insecure_dev()),
    ));
    let ledger = ActionLedger::new(
        store.clone(),
        Arc::new(Registry::builtin().unwrap()),
        resolver,
        Some(ADMIN.to_string()),
    );
    (ledger, store)
}

/// Submission through approval, then an administrative reset and re-review
#[tokio::test]
async fn test_full_review_cycle() {
    let dir = TempDir::new().unwrap();
    let (ledger, _store) = open_ledger(&dir);
    let alice = Identity::parse("alice@example.com").unwrap();

    let action = ledger
        .submit(&alice, "event_1", Some("VOLUNTEERED"))
        .await
        .unwrap();

    let payload = ledger
        .prepare_approval(ORGANIZER, &action.id, "VOLUNTEERED", 5)
        .await
        .unwrap();
    assert_eq!(payload.base_points, 20);
    assert_eq!(payload.bonus_points, 5);
    assert_eq!(payload.recipient_wallet, action.submitter_wallet);

    let receipt = json!({"txHash": "0x01", "points": 25});
    let (approved, outcome) = ledger
        .finalize(ORGANIZER, &action.id, receipt.clone())
        .await
        .unwrap();
    assert_eq!(outcome, FinalizeOutcome::Finalized);
    assert_eq!(approved.status, ActionStatus::Approved);

    // A second mint attempt cannot be prepared
    assert!(matches!(
        ledger
            .prepare_approval(ORGANIZER, &action.id, "VOLUNTEERED", 0)
            .await,
        Err(LedgerError::InvalidTransition { .. })
    ));

    let reset = ledger.reset(ADMIN, &action.id).await.unwrap();
    assert_eq!(reset.status, ActionStatus::Pending);
    assert_eq!(reset.history.len(), 2);
    assert_eq!(reset.history[1].previous_final_data, Some(receipt));

    let (rejected, _) = ledger.reject(ORGANIZER, &action.id).await.unwrap();
    assert_eq!(rejected.status, ActionStatus::Rejected);
    assert_eq!(rejected.revision, 3);
}

/// Records and wallets survive closing and reopening the database
#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let alice = Identity::parse("alice@example.com").unwrap();

    let (action_id, wallet) = {
        let (ledger, store) = open_ledger(&dir);
        let action = ledger.submit(&alice, "event_1", None).await.unwrap();
        ledger.reject(ORGANIZER, &action.id).await.unwrap();
        store.flush().await.unwrap();
        (action.id, action.submitter_wallet)
    };

    let (ledger, _store) = open_ledger(&dir);
    let action = ledger.get(&action_id).await.unwrap();
    assert_eq!(action.status, ActionStatus::Rejected);

    // Same email, same wallet, and the sequence continues
    let next = ledger.submit(&alice, "event_1", None).await.unwrap();
    assert_eq!(next.submitter_wallet, wallet);
    assert_eq!(next.sequence, action.sequence + 1);
    assert_eq!(ledger.resolver().wallet_count().await.unwrap(), 1);
}

/// Two simultaneous first submissions from one new email share a wallet
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_submissions_share_wallet() {
    let dir = TempDir::new().unwrap();
    let (ledger, _store) = open_ledger(&dir);
    let ledger = Arc::new(ledger);

    let spawn_submit = |ledger: Arc<ActionLedger>| {
        tokio::spawn(async move {
            let bob = Identity::parse("bob@example.com").unwrap();
            ledger.submit(&bob, "event_1", None).await
        })
    };
    let first = spawn_submit(Arc::clone(&ledger));
    let second = spawn_submit(Arc::clone(&ledger));

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.submitter_wallet, second.submitter_wallet);
    assert_eq!(ledger.resolver().wallet_count().await.unwrap(), 1);
    assert_eq!(ledger.list_pending().await.unwrap().len(), 2);
}

/// An event id nobody registered still accepts submissions
#[tokio::test]
async fn test_unregistered_event_submission() {
    let dir = TempDir::new().unwrap();
    let (ledger, _store) = open_ledger(&dir);
    let wallet = Identity::parse("0x00000000000000000000000000000000000000aa").unwrap();

    let action = ledger.submit(&wallet, "event_999", None).await.unwrap();

    assert_eq!(action.event_name_snapshot, "Unknown");
    assert_eq!(action.submitter_display, "direct wallet");
    // Nobody can review it: the event has no organizer
    assert!(matches!(
        ledger.reject(ORGANIZER, &action.id).await,
        Err(LedgerError::EventNotFound(_))
    ));
}
