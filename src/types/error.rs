//! Error types for the reputation ledger
//!
//! Pattern adapted from doorway's `DoorwayError`: one enum, a status code per
//! variant, and `From` conversions for the crates underneath.

use hyper::StatusCode;

use crate::ledger::ActionStatus;

/// Main error type for ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid action kind: {0}")]
    InvalidActionKind(String),

    #[error("Invalid bonus: {0} (bonus must not be negative)")]
    InvalidBonus(i64),

    #[error("Bonus {requested} exceeds cap {cap} for action kind {key}")]
    BonusExceedsCap {
        key: String,
        requested: i64,
        cap: u32,
    },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: ActionStatus, to: ActionStatus },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::EventNotFound(_) => StatusCode::BAD_REQUEST,
            Self::InvalidActionKind(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidBonus(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BonusExceedsCap { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::StorageFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, rendered next to the message
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::InvalidActionKind(_) => "INVALID_ACTION_KIND",
            Self::InvalidBonus(_) => "INVALID_BONUS",
            Self::BonusExceedsCap { .. } => "BONUS_EXCEEDS_CAP",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Conflict(_) => "CONFLICT",
            Self::StorageFailure(_) => "STORAGE_FAILURE",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error should page an operator rather than just be
    /// returned to the caller
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (status, body.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        Self::StorageFailure(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for LedgerError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::StorageFailure(format!("Serialization error: {}", err))
    }
}

impl From<rmp_serde::decode::Error> for LedgerError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::StorageFailure(format!("Corrupt record: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for LedgerError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidToken(err.to_string())
    }
}

impl From<hyper::Error> for LedgerError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_per_variant() {
        let errors = [
            LedgerError::NotFound("a".into()),
            LedgerError::Unauthorized("a".into()),
            LedgerError::EventNotFound("a".into()),
            LedgerError::InvalidActionKind("a".into()),
            LedgerError::InvalidBonus(-1),
            LedgerError::BonusExceedsCap {
                key: "a".into(),
                requested: 3,
                cap: 2,
            },
            LedgerError::InvalidTransition {
                from: ActionStatus::Rejected,
                to: ActionStatus::Approved,
            },
            LedgerError::Conflict("a".into()),
            LedgerError::StorageFailure("a".into()),
            LedgerError::InvalidToken("a".into()),
        ];

        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_only_storage_failure_is_operational() {
        assert!(LedgerError::StorageFailure("disk".into()).is_operational());
        assert!(!LedgerError::Conflict("race".into()).is_operational());
        assert!(!LedgerError::Unauthorized("nope".into()).is_operational());
    }

    #[test]
    fn test_body_carries_code() {
        let (status, body) = LedgerError::BonusExceedsCap {
            key: "CONTRIB_SMALL".into(),
            requested: 5,
            cap: 2,
        }
        .into_status_code_and_body();

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["code"], "BONUS_EXCEEDS_CAP");
    }
}
