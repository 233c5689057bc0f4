//! Axum extractors guarding protected endpoints.
//!
//! The `Authorization` header carries the raw access token, no scheme
//! prefix. A successful extraction injects the token's claims into the
//! handler; the request body is never touched.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use super::errors::{AuthError, AuthErrorKind};
use crate::db::UserRole;
use crate::jwt::{Claims, JwtConfig};

/// Trait for state types that expose the token service to the guards.
pub trait HasJwt {
    fn jwt(&self) -> &JwtConfig;
}

fn authenticate<S: HasJwt>(parts: &Parts, state: &S) -> Result<Claims, AuthError> {
    let token = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError(AuthErrorKind::NotAuthenticated))?;

    state
        .jwt()
        .validate_access(token.trim())
        .ok_or(AuthError(AuthErrorKind::InvalidToken))
}

/// Extractor for endpoints that require any authenticated identity.
pub struct Auth(pub Claims);

impl<S> FromRequestParts<S> for Auth
where
    S: HasJwt + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(Auth)
    }
}

/// Extractor for endpoints restricted to admins. Same checks as [`Auth`]
/// plus a role gate.
pub struct AdminAuth(pub Claims);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: HasJwt + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = authenticate(parts, state)?;
        if claims.role != UserRole::Admin {
            return Err(AuthError(AuthErrorKind::InsufficientRole));
        }
        Ok(AdminAuth(claims))
    }
}

/// Macro to implement [`HasJwt`] for state structs with a `jwt` field.
#[macro_export]
macro_rules! impl_has_jwt {
    ($state_type:ty) => {
        impl $crate::auth::HasJwt for $state_type {
            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                &self.jwt
            }
        }
    };
}
