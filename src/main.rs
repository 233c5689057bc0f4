use clap::Parser;
use tracing::{error, info};

use tradepost::cli::{Args, build_config, init_logging, load_jwt_secret, open_database};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(access_secret) =
        load_jwt_secret("JWT_ACCESS_SECRET", args.access_secret_file.as_deref())
    else {
        std::process::exit(1);
    };
    let Some(refresh_secret) =
        load_jwt_secret("JWT_REFRESH_SECRET", args.refresh_secret_file.as_deref())
    else {
        std::process::exit(1);
    };
    if access_secret == refresh_secret {
        error!("Access and refresh secrets must differ");
        std::process::exit(1);
    }

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap();
    info!(address = %local_addr, "Listening");

    let config = build_config(db, access_secret, refresh_secret, args.secure_cookies);
    if let Err(e) = tradepost::run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
