//! Session API endpoints.
//!
//! - POST `/register` - Create an account, issue the first token pair
//! - POST `/login` - Verify credentials, issue a fresh pair
//! - POST `/updateToken` - Exchange the refresh cookie for a new pair
//! - POST `/changePassword` - Rotate the password, reissue tokens
//! - POST `/changeName` - Rename the account, reissue tokens
//! - POST `/changeAbout` - Update the profile text, reissue tokens
//! - POST `/delete` - Delete the account and its products, no reissue
//!
//! All token-bearing responses put the access token in the body and the
//! rotated refresh token in the `refresh` cookie.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::post,
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use super::respond::{ValidJson, data_reply, session_reply};
use crate::auth::{Auth, AuthService, REFRESH_COOKIE_NAME, get_cookie};
use crate::impl_has_jwt;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct SessionState {
    pub auth: AuthService,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

impl_has_jwt!(SessionState);

pub fn router(state: SessionState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/updateToken", post(update_token))
        .route("/changePassword", post(change_password))
        .route("/changeName", post(change_name))
        .route("/changeAbout", post(change_about))
        .route("/delete", post(delete_account))
        .with_state(state)
}

#[derive(Deserialize)]
struct CredentialsRequest {
    name: String,
    password: String,
}

async fn register(
    State(state): State<SessionState>,
    ValidJson(body): ValidJson<CredentialsRequest>,
) -> Result<Response, ApiError> {
    let pair = state.auth.register(&body.name, &body.password).await?;
    Ok(session_reply(StatusCode::CREATED, &pair, state.secure_cookies))
}

async fn login(
    State(state): State<SessionState>,
    ValidJson(body): ValidJson<CredentialsRequest>,
) -> Result<Response, ApiError> {
    let pair = state.auth.login(&body.name, &body.password).await?;
    Ok(session_reply(StatusCode::OK, &pair, state.secure_cookies))
}

async fn update_token(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let refresh_token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("No refresh token"))?;

    let pair = state.auth.refresh(refresh_token)?;
    Ok(session_reply(StatusCode::CREATED, &pair, state.secure_cookies))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<SessionState>,
    Auth(claims): Auth,
    ValidJson(body): ValidJson<ChangePasswordRequest>,
) -> Result<Response, ApiError> {
    let pair = state
        .auth
        .change_password(claims.id, &body.old_password, &body.new_password)
        .await?;
    Ok(session_reply(StatusCode::OK, &pair, state.secure_cookies))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeNameRequest {
    new_name: String,
}

async fn change_name(
    State(state): State<SessionState>,
    Auth(claims): Auth,
    ValidJson(body): ValidJson<ChangeNameRequest>,
) -> Result<Response, ApiError> {
    let pair = state.auth.change_name(claims.id, &body.new_name).await?;
    Ok(session_reply(StatusCode::OK, &pair, state.secure_cookies))
}

#[derive(Deserialize)]
struct ChangeAboutRequest {
    about: String,
}

async fn change_about(
    State(state): State<SessionState>,
    Auth(claims): Auth,
    ValidJson(body): ValidJson<ChangeAboutRequest>,
) -> Result<Response, ApiError> {
    let pair = state.auth.change_about(claims.id, &body.about).await?;
    Ok(session_reply(StatusCode::OK, &pair, state.secure_cookies))
}

#[derive(Deserialize)]
struct DeleteAccountRequest {
    password: String,
}

async fn delete_account(
    State(state): State<SessionState>,
    Auth(claims): Auth,
    ValidJson(body): ValidJson<DeleteAccountRequest>,
) -> Result<Response, ApiError> {
    let message = state.auth.delete_account(claims.id, &body.password).await?;
    Ok(data_reply(StatusCode::OK, message))
}
