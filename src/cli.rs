//! CLI argument parsing, validation, and startup helpers.

use clap::Parser;
use tracing::error;

use crate::ServerConfig;
use crate::db::Database;
use crate::password::PasswordService;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "Tradepost", about = "Marketplace backend with JWT sessions")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tradepost.db")]
    pub database: String,

    /// Path to file containing the access-token secret.
    /// Prefer the JWT_ACCESS_SECRET env var instead
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh-token secret.
    /// Prefer the JWT_REFRESH_SECRET env var instead
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Set the Secure flag on the refresh cookie (enable behind HTTPS)
    #[arg(long)]
    pub secure_cookies: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load a JWT secret from the named environment variable or a file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(env_var: &str, secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking.
        // SAFETY: we're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set the {} environment variable (recommended) or pass a secret file",
            env_var
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Open the database, logging a fatal error on failure.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => Some(db),
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

/// Assemble the server configuration from validated startup inputs.
pub fn build_config(
    db: Database,
    access_secret: String,
    refresh_secret: String,
    secure_cookies: bool,
) -> ServerConfig {
    ServerConfig {
        db,
        access_secret: access_secret.into_bytes(),
        refresh_secret: refresh_secret.into_bytes(),
        secure_cookies,
        passwords: PasswordService::new(),
    }
}
