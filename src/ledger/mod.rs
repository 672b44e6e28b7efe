//! Action lifecycle
//!
//! [`ActionLedger`] is the only writer of action status. Records live in the
//! [`KvStore`](crate::db::KvStore) under `actions/{id}`.

mod action;
mod service;

pub use action::{
    Action, ActionStatus, FinalizeOutcome, RejectOutcome, RewardPayload, TransitionRecord,
    UNKNOWN_EVENT_NAME,
};
pub use service::ActionLedger;
