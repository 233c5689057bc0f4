mod error;
mod respond;
mod session;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::password::PasswordService;

pub use error::{ApiError, ResultExt};

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    passwords: PasswordService,
    secure_cookies: bool,
) -> Router {
    let session_state = session::SessionState {
        auth: AuthService::new(db.clone(), jwt.clone(), passwords),
        jwt,
        secure_cookies,
    };

    let users_state = users::UsersState { db };

    Router::new()
        .nest("/auth", session::router(session_state))
        .nest("/user", users::router(users_state))
}
