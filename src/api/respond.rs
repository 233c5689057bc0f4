//! Pieces of the shared request/response contract.
//!
//! Every endpoint follows the same sequence: validate the inbound shape
//! (`ValidJson`, 422 on failure), invoke one service method, short-circuit
//! on its error, then write the success payload as `{"data": T}`. Session
//! endpoints additionally shape the result through [`session_reply`], which
//! moves the refresh token out of the body into an HttpOnly cookie.

use axum::{
    Json,
    extract::{FromRequest, Request},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::error::ApiError;
use crate::auth::refresh_cookie;
use crate::jwt::TokenPair;

/// Success payload envelope.
#[derive(Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// JSON body extractor that rejects any malformed or mis-shaped input with
/// 422 and the uniform error payload, instead of axum's default rejection.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(_) => Err(ApiError::unprocessable("Invalid data")),
        }
    }
}

#[derive(Serialize)]
struct AccessTokenBody {
    access: String,
}

/// Write a success payload with the given status.
pub fn data_reply<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(Data { data: value })).into_response()
}

/// Shape a token pair into the session response: the access token goes into
/// the body, the refresh token into a `Set-Cookie: refresh=...` header and
/// nowhere else.
pub fn session_reply(status: StatusCode, pair: &TokenPair, secure_cookies: bool) -> Response {
    let cookie = refresh_cookie(&pair.refresh, secure_cookies);

    let mut response = data_reply(
        status,
        AccessTokenBody {
            access: pair.access.clone(),
        },
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}
