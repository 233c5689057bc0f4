//! Public user profile endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde::Serialize;

use super::error::{ApiError, ResultExt};
use super::respond::data_reply;
use crate::db::{Database, UserRole};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
}

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/getUser/{id}", get(get_user))
        .with_state(state)
}

#[derive(Serialize)]
struct ProfileResponse {
    id: i64,
    name: String,
    role: UserRole,
    about: Option<String>,
}

/// Public profile lookup. Never exposes the password hash.
async fn get_user(
    State(state): State<UsersState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let user = state
        .db
        .users()
        .get_by_id(id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::not_found("No such user"))?;

    Ok(data_reply(
        StatusCode::OK,
        ProfileResponse {
            id: user.id,
            name: user.name,
            role: user.role,
            about: user.about,
        },
    ))
}
