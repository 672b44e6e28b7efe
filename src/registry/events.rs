//! Event Registry
//!
//! Each event names the single organizer allowed to review actions filed
//! under it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{LedgerError, Result};

/// A community event and its organizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub organizer_identity: String,
    pub created_at: DateTime<Utc>,
}

/// Loaded-once registry of events
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    events: Vec<Event>,
    index: HashMap<String, usize>,
}

impl EventRegistry {
    /// Build a registry. Event ids must be unique and every event needs an
    /// organizer.
    pub fn new(events: Vec<Event>) -> Result<Self> {
        let mut index = HashMap::with_capacity(events.len());
        for (position, event) in events.iter().enumerate() {
            if event.id.trim().is_empty() {
                return Err(LedgerError::Config("Event with empty id".into()));
            }
            if event.organizer_identity.trim().is_empty() {
                return Err(LedgerError::Config(format!(
                    "Event {} has no organizer",
                    event.id
                )));
            }
            if index.insert(event.id.clone(), position).is_some() {
                return Err(LedgerError::Config(format!("Duplicate event id: {}", event.id)));
            }
        }

        Ok(Self { events, index })
    }

    pub fn get(&self, event_id: &str) -> Option<&Event> {
        self.index.get(event_id).map(|&position| &self.events[position])
    }

    /// All events in declaration order
    pub fn list(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
