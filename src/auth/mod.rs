//! Authentication and authorization
//!
//! Provides:
//! - Identity token verification (JWT) yielding a verified email
//! - The authorization guard for organizer and admin scopes

pub mod guard;
pub mod verifier;

pub use guard::{AuthorityScope, AuthorizationGuard, Authorized};
pub use verifier::{extract_bearer_token, IdTokenClaims, IdentityVerifier, JwtIdentityVerifier};
