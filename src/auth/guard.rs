//! Authorization Guard
//!
//! Two authority scopes, never conflated:
//! - **EventOrganizer**: the one identity registered as an event's organizer
//!   may review actions under that event
//! - **GlobalAdmin**: the configured administrator may run administrative
//!   operations (reset) on any action
//!
//! Identities are compared trimmed and case-insensitively; addresses have
//! no canonical case.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::registry::Registry;
use crate::types::{LedgerError, Result};

/// Which authority an operation requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityScope<'a> {
    EventOrganizer(&'a str),
    GlobalAdmin,
}

impl fmt::Display for AuthorityScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorityScope::EventOrganizer(event_id) => write!(f, "organizer of {}", event_id),
            AuthorityScope::GlobalAdmin => write!(f, "global admin"),
        }
    }
}

/// Proof that a caller passed the guard for some scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    /// Caller identity as presented
    pub caller: String,
    /// Human-readable scope the caller was authorized for
    pub scope: String,
}

/// Decides whether a caller may act within a scope
pub struct AuthorizationGuard {
    registry: Arc<Registry>,
    admin_identity: Option<String>,
}

fn same_identity(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl AuthorizationGuard {
    pub fn new(registry: Arc<Registry>, admin_identity: Option<String>) -> Self {
        let admin_identity = admin_identity
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        Self {
            registry,
            admin_identity,
        }
    }

    /// Check `caller` against `scope`
    pub fn authorize(&self, caller: &str, scope: AuthorityScope<'_>) -> Result<Authorized> {
        let caller = caller.trim();
        if caller.is_empty() {
            return Err(LedgerError::Unauthorized("No caller identity".into()));
        }

        let permitted = match scope {
            AuthorityScope::EventOrganizer(event_id) => {
                let event = self
                    .registry
                    .events
                    .get(event_id)
                    .ok_or_else(|| LedgerError::EventNotFound(event_id.to_string()))?;
                same_identity(&event.organizer_identity, caller)
            }
            AuthorityScope::GlobalAdmin => self
                .admin_identity
                .as_deref()
                .is_some_and(|admin| same_identity(admin, caller)),
        };

        if !permitted {
            debug!(caller = %caller, scope = %scope, "Authorization denied");
            return Err(LedgerError::Unauthorized(format!(
                "{} is not the {}",
                caller, scope
            )));
        }

        Ok(Authorized {
            caller: caller.to_string(),
            scope: scope.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Event, EventRegistry, SchemaRegistry};
    use chrono::Utc;

    const ORGANIZER_A: &str = "0xCB7823F557E49fd23C70C27fa7739D8e695561B6";
    const ORGANIZER_B: &str = "0x1111111111111111111111111111111111111111";
    const ADMIN: &str = "admin@example.com";

    fn guard(admin: Option<&str>) -> AuthorizationGuard {
        let events = EventRegistry::new(vec![
            Event {
                id: "event_a".into(),
                name: "A".into(),
                organizer_identity: ORGANIZER_A.into(),
                created_at: Utc::now(),
            },
            Event {
                id: "event_b".into(),
                name: "B".into(),
                organizer_identity: ORGANIZER_B.into(),
                created_at: Utc::now(),
            },
        ])
        .unwrap();
        let schema = SchemaRegistry::new("c", "s", 1, vec![]).unwrap();
        AuthorizationGuard::new(
            Arc::new(Registry::new(schema, events)),
            admin.map(str::to_string),
        )
    }

    #[test]
    fn test_organizer_authorized_for_own_event() {
        let guard = guard(None);
        let authorized = guard
            .authorize(ORGANIZER_A, AuthorityScope::EventOrganizer("event_a"))
            .unwrap();
        assert_eq!(authorized.caller, ORGANIZER_A);
    }

    #[test]
    fn test_casing_does_not_matter() {
        let guard = guard(None);
        for caller in [ORGANIZER_A.to_lowercase(), ORGANIZER_A.to_uppercase()] {
            assert!(guard
                .authorize(&caller, AuthorityScope::EventOrganizer("event_a"))
                .is_ok());
        }
    }

    #[test]
    fn test_organizer_of_other_event_rejected() {
        let guard = guard(None);
        assert!(matches!(
            guard.authorize(ORGANIZER_A, AuthorityScope::EventOrganizer("event_b")),
            Err(LedgerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_unknown_event() {
        let guard = guard(None);
        assert!(matches!(
            guard.authorize(ORGANIZER_A, AuthorityScope::EventOrganizer("event_z")),
            Err(LedgerError::EventNotFound(_))
        ));
    }

    #[test]
    fn test_scopes_are_separate() {
        let guard = guard(Some(ADMIN));

        // Organizer is not admin
        assert!(matches!(
            guard.authorize(ORGANIZER_A, AuthorityScope::GlobalAdmin),
            Err(LedgerError::Unauthorized(_))
        ));
        // Admin is not an organizer
        assert!(matches!(
            guard.authorize(ADMIN, AuthorityScope::EventOrganizer("event_a")),
            Err(LedgerError::Unauthorized(_))
        ));
        assert!(guard
            .authorize("Admin@Example.com", AuthorityScope::GlobalAdmin)
            .is_ok());
    }

    #[test]
    fn test_no_admin_configured_denies_everyone() {
        let guard = guard(Some("  "));
        assert!(guard.authorize(ADMIN, AuthorityScope::GlobalAdmin).is_err());
    }

    #[test]
    fn test_empty_caller() {
        let guard = guard(Some(ADMIN));
        assert!(matches!(
            guard.authorize(" ", AuthorityScope::GlobalAdmin),
            Err(LedgerError::Unauthorized(_))
        ));
    }
}
