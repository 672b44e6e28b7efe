//! Reputation Ledger - organizer-reviewed community actions
//!
//! Participants submit claims of community contributions ("actions").
//! The organizer of the event an action belongs to reviews it, and an
//! approval yields a reward payload bounded by the community schema.
//!
//! ## Components
//!
//! - **Registry**: action kinds with base points and bonus caps, and events
//!   with their organizers
//! - **Wallet resolver**: one custodial wallet per email, created on first sight
//! - **Authorization guard**: event organizer and global admin scopes
//! - **Action ledger**: the `pending -> approved | rejected` state machine
//! - **Server**: JSON over HTTP

pub mod auth;
pub mod config;
pub mod custodial_keys;
pub mod db;
pub mod identity;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use ledger::ActionLedger;
pub use server::{run, AppState};
pub use types::{LedgerError, Result};
