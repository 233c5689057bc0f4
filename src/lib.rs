pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;

use api::create_api_router;
use axum::Router;
use db::Database;
use jwt::JwtConfig;
use password::PasswordService;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret signing access tokens
    pub access_secret: Vec<u8>,
    /// Secret signing refresh tokens (must differ from the access secret)
    pub refresh_secret: Vec<u8>,
    /// Whether to set the Secure flag on the refresh cookie
    pub secure_cookies: bool,
    /// Password hashing service (tests inject a low-cost one)
    pub passwords: PasswordService,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.access_secret, &config.refresh_secret));

    create_api_router(
        config.db.clone(),
        jwt,
        config.passwords.clone(),
        config.secure_cookies,
    )
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
