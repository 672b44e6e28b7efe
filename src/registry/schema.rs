//! Schema Registry and Point Calculator
//!
//! A schema is the versioned list of action kinds a community recognizes.
//! Each kind carries a base point value and a ceiling on the bonus an
//! organizer may add at approval time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{LedgerError, Result};

/// A recognized kind of action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionKind {
    pub key: String,
    pub label: String,
    pub base_points: u32,
    pub bonus_cap: u32,
}

/// Points awarded for one approved action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Points {
    pub base: u32,
    pub bonus: u32,
}

/// Loaded-once schema of action kinds
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    community_id: String,
    schema_id: String,
    version: u32,
    kinds: Vec<ActionKind>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Build a schema, rejecting duplicate or empty keys
    pub fn new(
        community_id: impl Into<String>,
        schema_id: impl Into<String>,
        version: u32,
        kinds: Vec<ActionKind>,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(kinds.len());
        for (position, kind) in kinds.iter().enumerate() {
            if kind.key.trim().is_empty() {
                return Err(LedgerError::Config("Action kind with empty key".into()));
            }
            if index.insert(kind.key.clone(), position).is_some() {
                return Err(LedgerError::Config(format!(
                    "Duplicate action kind: {}",
                    kind.key
                )));
            }
        }

        Ok(Self {
            community_id: community_id.into(),
            schema_id: schema_id.into(),
            version,
            kinds,
            index,
        })
    }

    pub fn community_id(&self) -> &str {
        &self.community_id
    }

    pub fn schema_id(&self) -> &str {
        &self.schema_id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Look up an action kind by key
    pub fn lookup(&self, key: &str) -> Option<&ActionKind> {
        self.index.get(key).map(|&position| &self.kinds[position])
    }

    /// All kinds in declaration order
    pub fn list(&self) -> &[ActionKind] {
        &self.kinds
    }

    /// Compute the points for approving `key` with `requested_bonus`.
    ///
    /// A bonus equal to the cap is allowed. Out-of-range bonuses are errors,
    /// never clamped.
    pub fn compute_points(&self, key: &str, requested_bonus: i64) -> Result<Points> {
        let kind = self
            .lookup(key)
            .ok_or_else(|| LedgerError::InvalidActionKind(key.to_string()))?;

        if requested_bonus < 0 {
            return Err(LedgerError::InvalidBonus(requested_bonus));
        }

        if requested_bonus > i64::from(kind.bonus_cap) {
            return Err(LedgerError::BonusExceedsCap {
                key: kind.key.clone(),
                requested: requested_bonus,
                cap: kind.bonus_cap,
            });
        }

        Ok(Points {
            base: kind.base_points,
            // Bounded by bonus_cap above
            bonus: requested_bonus as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(key: &str, base_points: u32, bonus_cap: u32) -> ActionKind {
        ActionKind {
            key: key.to_string(),
            label: key.to_lowercase(),
            base_points,
            bonus_cap,
        }
    }

    fn schema() -> SchemaRegistry {
        SchemaRegistry::new(
            "community-1",
            "schema-1",
            1,
            vec![kind("CONTRIB_SMALL", 10, 2), kind("ATTENDED_EVENT", 5, 0)],
        )
        .unwrap()
    }

    #[test]
    fn test_bonus_within_cap() {
        let schema = schema();

        for bonus in 0..=2 {
            let points = schema.compute_points("CONTRIB_SMALL", bonus).unwrap();
            assert_eq!(points, Points { base: 10, bonus: bonus as u32 });
        }
    }

    #[test]
    fn test_bonus_over_cap_is_not_clamped() {
        let schema = schema();

        match schema.compute_points("CONTRIB_SMALL", 5) {
            Err(LedgerError::BonusExceedsCap {
                key,
                requested,
                cap,
            }) => {
                assert_eq!(key, "CONTRIB_SMALL");
                assert_eq!(requested, 5);
                assert_eq!(cap, 2);
            }
            other => panic!("expected BonusExceedsCap, got {other:?}"),
        }

        assert!(matches!(
            schema.compute_points("ATTENDED_EVENT", 1),
            Err(LedgerError::BonusExceedsCap { .. })
        ));
    }

    #[test]
    fn test_negative_bonus() {
        assert!(matches!(
            schema().compute_points("CONTRIB_SMALL", -1),
            Err(LedgerError::InvalidBonus(-1))
        ));
    }

    #[test]
    fn test_unknown_kind_checked_before_bonus() {
        assert!(matches!(
            schema().compute_points("NOPE", -7),
            Err(LedgerError::InvalidActionKind(_))
        ));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let result = SchemaRegistry::new(
            "c",
            "s",
            1,
            vec![kind("A", 1, 1), kind("A", 2, 2)],
        );
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_list_keeps_declaration_order() {
        let schema = schema();
        let keys: Vec<&str> = schema.list().iter().map(|k| k.key.as_str()).collect();
        assert_eq!(keys, vec!["CONTRIB_SMALL", "ATTENDED_EVENT"]);
    }
}
