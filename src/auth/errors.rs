//! Guard rejection types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why a protected request was rejected.
#[derive(Debug)]
pub enum AuthErrorKind {
    /// No Authorization header on the request
    NotAuthenticated,
    /// Token present but failed signature or expiry checks
    InvalidToken,
    /// Valid token, wrong role
    InsufficientRole,
}

/// Rejection emitted by the auth extractors. Stateless bearer tokens mean
/// there is nothing to clear or revoke here; the response is just the
/// uniform error payload.
#[derive(Debug)]
pub struct AuthError(pub(super) AuthErrorKind);

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AuthErrorKind::NotAuthenticated | AuthErrorKind::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthErrorKind::InsufficientRole => StatusCode::FORBIDDEN,
        }
    }

    fn message(&self) -> &'static str {
        match self.0 {
            AuthErrorKind::NotAuthenticated => "Not authenticated",
            AuthErrorKind::InvalidToken => "Invalid or expired token",
            AuthErrorKind::InsufficientRole => "Insufficient permissions",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
