//! Authentication subsystem: session orchestration, bearer-token guards,
//! and refresh-cookie plumbing.
//!
//! Dual-token sessions: a short-lived access token travels in the
//! `Authorization` header (raw token, no scheme prefix) and a long-lived
//! refresh token in an HttpOnly cookie. Tokens are stateless; every
//! identity-affecting operation rotates the whole pair.

mod cookie;
mod errors;
mod extractors;
mod service;

pub use cookie::{REFRESH_COOKIE_NAME, get_cookie, refresh_cookie};
pub use errors::AuthError;
pub use extractors::{AdminAuth, Auth, HasJwt};
pub use service::AuthService;
