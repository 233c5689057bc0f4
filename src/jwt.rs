//! JWT token generation and validation.
//!
//! Dual-secret system: short-lived access tokens (10 minutes) and long-lived
//! refresh tokens (2 days) are signed with distinct secrets. Tokens are
//! stateless; expiry is the only invalidation mechanism and there is no
//! revocation list. Validation uses zero leeway, so clock skew between
//! issuer and validator is not compensated (known limitation).

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::UserRole;

/// Access token duration: 10 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 10 * 60;

/// Refresh token duration: 2 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 2 * 24 * 60 * 60;

/// Identity snapshot embedded in every token.
///
/// Both tokens of a pair carry the same identity fields at issuance. A later
/// profile mutation does not invalidate tokens already in flight; mutation
/// endpoints reissue a fresh pair instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (server-assigned row id)
    pub id: i64,
    /// Username at issuance time
    pub name: String,
    /// User role
    pub role: UserRole,
    /// Profile "about" text, if set
    pub about: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Identity fields a token pair is issued for.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub role: UserRole,
    pub about: Option<String>,
}

/// A freshly issued access/refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Configuration for JWT operations. Holds both key pairs.
#[derive(Clone)]
pub struct JwtConfig {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl JwtConfig {
    /// Create a new JWT configuration with distinct access and refresh secrets.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    /// Issue a token pair for a user. Both tokens encode the same identity
    /// claims; only the expiry window and signing secret differ.
    ///
    /// Signing failures are unrecoverable configuration problems and
    /// propagate as a hard error, never as a silently invalid token.
    pub fn issue(&self, user: &SessionUser) -> Result<TokenPair, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| JwtError::TimeError)?
            .as_secs();

        let access_claims = Claims {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
            about: user.about.clone(),
            iat: now,
            exp: now + ACCESS_TOKEN_DURATION_SECS,
        };
        let refresh_claims = Claims {
            exp: now + REFRESH_TOKEN_DURATION_SECS,
            ..access_claims.clone()
        };

        let access = jsonwebtoken::encode(&Header::default(), &access_claims, &self.access_encoding)
            .map_err(JwtError::Encoding)?;
        let refresh =
            jsonwebtoken::encode(&Header::default(), &refresh_claims, &self.refresh_encoding)
                .map_err(JwtError::Encoding)?;

        Ok(TokenPair { access, refresh })
    }

    /// Validate an access token. Returns `None` on any verification failure
    /// (bad signature, expired, malformed); "invalid token" is an expected,
    /// frequent outcome, not a fault.
    pub fn validate_access(&self, token: &str) -> Option<Claims> {
        Self::validate(token, &self.access_decoding)
    }

    /// Validate a refresh token against the refresh secret. Same soft-fail
    /// contract as [`validate_access`](Self::validate_access).
    pub fn validate_refresh(&self, token: &str) -> Option<Claims> {
        Self::validate(token, &self.refresh_decoding)
    }

    fn validate(token: &str, key: &DecodingKey) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .ok()
    }
}

/// Errors that can occur while issuing tokens.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token (misconfigured key)
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new(b"access-secret-for-testing", b"refresh-secret-for-testing")
    }

    fn alice() -> SessionUser {
        SessionUser {
            id: 7,
            name: "alice".to_string(),
            role: UserRole::User,
            about: Some("seller of hats".to_string()),
        }
    }

    #[test]
    fn test_issue_and_validate_roundtrip() {
        let config = config();
        let pair = config.issue(&alice()).unwrap();

        let claims = config.validate_access(&pair.access).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.about.as_deref(), Some("seller of hats"));

        let refresh_claims = config.validate_refresh(&pair.refresh).unwrap();
        assert_eq!(refresh_claims.id, claims.id);
        assert_eq!(refresh_claims.name, claims.name);
        assert_eq!(refresh_claims.about, claims.about);
    }

    #[test]
    fn test_pair_claims_match_at_issuance() {
        let config = config();
        let pair = config.issue(&alice()).unwrap();

        let access = config.validate_access(&pair.access).unwrap();
        let refresh = config.validate_refresh(&pair.refresh).unwrap();

        // Identical identity claims, only the expiry windows differ.
        assert_eq!(access.iat, refresh.iat);
        assert_eq!(access.exp, access.iat + ACCESS_TOKEN_DURATION_SECS);
        assert_eq!(refresh.exp, refresh.iat + REFRESH_TOKEN_DURATION_SECS);
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let config = config();
        let pair = config.issue(&alice()).unwrap();

        assert!(config.validate_refresh(&pair.access).is_none());
        assert!(config.validate_access(&pair.refresh).is_none());
    }

    #[test]
    fn test_wrong_secret_soft_fails() {
        let config1 = config();
        let config2 = JwtConfig::new(b"some-other-access-secret", b"some-other-refresh-secret");

        let pair = config1.issue(&alice()).unwrap();
        assert!(config2.validate_access(&pair.access).is_none());
        assert!(config2.validate_refresh(&pair.refresh).is_none());
    }

    #[test]
    fn test_malformed_token_soft_fails() {
        let config = config();
        assert!(config.validate_access("not-a-jwt").is_none());
        assert!(config.validate_access("").is_none());
        assert!(config.validate_refresh("a.b.c").is_none());
    }

    #[test]
    fn test_expired_token_soft_fails() {
        let secret = b"access-secret-for-testing";
        let encoding_key = EncodingKey::from_secret(secret);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let claims = Claims {
            id: 7,
            name: "alice".to_string(),
            role: UserRole::User,
            about: None,
            iat: now - 100,
            exp: now - 50, // expired 50 seconds ago
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &encoding_key).unwrap();

        let config = JwtConfig::new(secret, b"refresh-secret-for-testing");
        assert!(config.validate_access(&token).is_none());
    }

    #[test]
    fn test_admin_role_in_token() {
        let config = config();
        let admin = SessionUser {
            id: 1,
            name: "root".to_string(),
            role: UserRole::Admin,
            about: None,
        };

        let pair = config.issue(&admin).unwrap();
        let claims = config.validate_access(&pair.access).unwrap();
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.about.is_none());
    }
}
