//! Refresh-cookie parsing and building.

use axum::http::header;

use crate::jwt::REFRESH_TOKEN_DURATION_SECS;

/// Cookie name carrying the refresh token (long-lived, 2 days).
pub const REFRESH_COOKIE_NAME: &str = "refresh";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Build the Set-Cookie value for a rotated refresh token. HttpOnly keeps it
/// away from scripts; the access token never travels by cookie.
pub fn refresh_cookie(token: &str, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        REFRESH_COOKIE_NAME, token, REFRESH_TOKEN_DURATION_SECS, secure
    )
}
