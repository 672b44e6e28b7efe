//! Schema and event configuration
//!
//! Both registries are built once at startup, from a TOML file or the
//! built-in defaults, and handed to the ledger. Nothing mutates them after
//! that; tests build their own.

pub mod events;
pub mod schema;

pub use events::{Event, EventRegistry};
pub use schema::{ActionKind, Points, SchemaRegistry};

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::types::{LedgerError, Result};

// =============================================================================
// File format
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    schema: SchemaSection,
    #[serde(default)]
    events: Vec<EventEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaSection {
    community_id: String,
    schema_id: String,
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    actions: Vec<ActionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActionEntry {
    key: String,
    label: String,
    base_points: u32,
    #[serde(default)]
    bonus_cap: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EventEntry {
    id: String,
    name: String,
    organizer: String,
    /// RFC 3339; defaults to load time
    created_at: Option<String>,
}

fn default_version() -> u32 {
    1
}

// =============================================================================
// Registry
// =============================================================================

/// The schema and event registries the ledger runs against
#[derive(Debug, Clone)]
pub struct Registry {
    pub schema: SchemaRegistry,
    pub events: EventRegistry,
}

impl Registry {
    pub fn new(schema: SchemaRegistry, events: EventRegistry) -> Self {
        Self { schema, events }
    }

    /// Load a registry from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("Failed to read registry {}: {}", path.display(), e))
        })?;
        let registry = Self::from_toml_str(&contents)?;

        info!(
            path = %path.display(),
            schema_id = %registry.schema.schema_id(),
            version = registry.schema.version(),
            action_kinds = registry.schema.list().len(),
            events = registry.events.len(),
            "Loaded registry"
        );

        Ok(registry)
    }

    /// Parse a registry from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(contents)
            .map_err(|e| LedgerError::Config(format!("Invalid registry file: {}", e)))?;

        let kinds = file
            .schema
            .actions
            .into_iter()
            .map(|entry| ActionKind {
                key: entry.key,
                label: entry.label,
                base_points: entry.base_points,
                bonus_cap: entry.bonus_cap,
            })
            .collect();
        let schema = SchemaRegistry::new(
            file.schema.community_id,
            file.schema.schema_id,
            file.schema.version,
            kinds,
        )?;

        let now = Utc::now();
        let events = file
            .events
            .into_iter()
            .map(|entry| -> Result<Event> {
                let created_at = match entry.created_at {
                    Some(raw) => DateTime::parse_from_rfc3339(&raw)
                        .map_err(|e| {
                            LedgerError::Config(format!(
                                "Event {} has invalid created_at: {}",
                                entry.id, e
                            ))
                        })?
                        .with_timezone(&Utc),
                    None => now,
                };
                Ok(Event {
                    id: entry.id,
                    name: entry.name,
                    organizer_identity: entry.organizer,
                    created_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(schema, EventRegistry::new(events)?))
    }

    /// Built-in registry used when no file is configured
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }
}

const BUILTIN_REGISTRY: &str = r#"
[schema]
community_id = "local-community"
schema_id = "community-actions"
version = 1

[[schema.actions]]
key = "ATTENDED_EVENT"
label = "Attended Event"
base_points = 10

[[schema.actions]]
key = "VOLUNTEERED"
label = "Volunteered"
base_points = 20
bonus_cap = 5

[[schema.actions]]
key = "DELIVERED_AID"
label = "Delivered Aid"
base_points = 30
bonus_cap = 10

[[schema.actions]]
key = "CONTRIB_SMALL"
label = "Small Contribution"
base_points = 10
bonus_cap = 2

[[events]]
id = "event_1"
name = "Community Cleanup"
organizer = "0xCB7823F557E49fd23C70C27fa7739D8e695561B6"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = Registry::builtin().unwrap();

        let small = registry.schema.lookup("CONTRIB_SMALL").unwrap();
        assert_eq!(small.base_points, 10);
        assert_eq!(small.bonus_cap, 2);

        // Omitted bonus_cap means no bonus allowed
        assert_eq!(registry.schema.lookup("ATTENDED_EVENT").unwrap().bonus_cap, 0);
        assert!(registry.events.get("event_1").is_some());
    }

    #[test]
    fn test_sample_registry_file() {
        let registry =
            Registry::from_toml_str(include_str!("../../config/registry.toml")).unwrap();
        assert_eq!(registry.schema.community_id(), "riverside-commons");
        assert_eq!(registry.events.len(), 2);
    }

    #[test]
    fn test_parse_with_created_at() {
        let registry = Registry::from_toml_str(
            r#"
[schema]
community_id = "c"
schema_id = "s"
version = 3

[[events]]
id = "e"
name = "E"
organizer = "0x0000000000000000000000000000000000000001"
created_at = "2025-03-01T12:00:00Z"
"#,
        )
        .unwrap();

        assert_eq!(registry.schema.version(), 3);
        let event = registry.events.get("e").unwrap();
        assert_eq!(event.created_at.to_rfc3339(), "2025-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = Registry::from_toml_str(
            r#"
[schema]
community_id = "c"
schema_id = "s"
bonus_multiplier = 2
"#,
        );
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_event_without_organizer_rejected() {
        let result = Registry::from_toml_str(
            r#"
[schema]
community_id = "c"
schema_id = "s"

[[events]]
id = "e"
name = "E"
organizer = ""
"#,
        );
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }
}
