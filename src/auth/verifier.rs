//! Identity token verification
//!
//! Participants sign in with a third-party ID token (a JWT carrying an email
//! claim). The ledger only needs the verified email out of it; how the token
//! is checked sits behind [`IdentityVerifier`].

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::identity::EmailIdentity;
use crate::types::{LedgerError, Result};

/// Verifies an opaque identity token and yields the email it vouches for
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<EmailIdentity>;
}

/// Claims read from an ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Subject identifier at the issuer
    pub sub: String,
    pub email: String,
    /// Issuers that send this claim must send `true`
    #[serde(default)]
    pub email_verified: Option<bool>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Extract a bearer token from an `Authorization` header value
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// JWT-based verifier with a static key
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    /// HS256 verifier with a shared secret
    ///
    /// Returns an error if the secret is shorter than 32 characters
    pub fn hs256(secret: &str, audience: Option<&str>, issuer: Option<&str>) -> Result<Self> {
        if secret.len() < 32 {
            return Err(LedgerError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }
        Ok(Self::build(
            DecodingKey::from_secret(secret.as_bytes()),
            Algorithm::HS256,
            audience,
            issuer,
        ))
    }

    /// RS256 verifier with an issuer's PEM public key
    pub fn rs256_pem(pem: &[u8], audience: Option<&str>, issuer: Option<&str>) -> Result<Self> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| LedgerError::Config(format!("Invalid RSA public key: {e}")))?;
        Ok(Self::build(key, Algorithm::RS256, audience, issuer))
    }

    fn build(
        key: DecodingKey,
        algorithm: Algorithm,
        audience: Option<&str>,
        issuer: Option<&str>,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        Self { key, validation }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<EmailIdentity> {
        let data = decode::<IdTokenClaims>(token, &self.key, &self.validation)?;
        let claims = data.claims;

        if claims.email_verified == Some(false) {
            return Err(LedgerError::InvalidToken("Email is not verified".into()));
        }

        EmailIdentity::parse(&claims.email)
            .map_err(|_| LedgerError::InvalidToken("Token email claim is malformed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-at-least-32-characters";

    fn token(secret: &str, email: &str, verified: Option<bool>, exp_offset: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset) as u64;
        let claims = IdTokenClaims {
            sub: "subject-1".into(),
            email: email.into(),
            email_verified: verified,
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_yields_normalized_email() {
        let verifier = JwtIdentityVerifier::hs256(SECRET, None, None).unwrap();
        let email = verifier
            .verify(&token(SECRET, "Alice@Example.com", Some(true), 3600))
            .await
            .unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let verifier = JwtIdentityVerifier::hs256(SECRET, None, None).unwrap();
        let forged = token("another-secret-that-is-also-32-characters", "a@b.c", None, 3600);
        assert!(matches!(
            verifier.verify(&forged).await,
            Err(LedgerError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let verifier = JwtIdentityVerifier::hs256(SECRET, None, None).unwrap();
        let expired = token(SECRET, "a@b.c", None, -3600);
        assert!(matches!(
            verifier.verify(&expired).await,
            Err(LedgerError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_unverified_email() {
        let verifier = JwtIdentityVerifier::hs256(SECRET, None, None).unwrap();
        assert!(matches!(
            verifier.verify(&token(SECRET, "a@b.c", Some(false), 3600)).await,
            Err(LedgerError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let verifier = JwtIdentityVerifier::hs256(SECRET, None, None).unwrap();
        assert!(verifier.verify("not-a-jwt").await.is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            JwtIdentityVerifier::hs256("short", None, None),
            Err(LedgerError::Config(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer   "), None);
    }
}
