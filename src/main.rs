use authserver::cli::{
    Args, build_config, handle_create_user, init_logging, jwt_settings, load_jwt_secret,
    open_database,
};
use authserver::jwt::JwtConfig;
use authserver::run_server;
use clap::Parser;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // Load .env before parsing so env-backed flags see it
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_format);

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env file"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let jwt = JwtConfig::new(&jwt_settings(&args, jwt_secret)).unwrap_or_else(|e| {
        error!(error = %e, "Invalid JWT configuration");
        std::process::exit(1);
    });

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let Some(email) = args.create_user.as_deref() {
        handle_create_user(&db, email).await;
        return;
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to get local address");
        std::process::exit(1);
    });

    let config = build_config(&args, db, jwt);

    info!(address = %local_addr, "Listening");

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
