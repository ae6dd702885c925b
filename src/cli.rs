//! CLI argument parsing, validation, and startup helpers.

use std::sync::Arc;
use std::time::Duration;

use crate::ServerConfig;
use crate::auth::{CookieSettings, HASH_COST, REFRESH_COOKIE_NAME, hash_password};
use crate::db::Database;
use crate::jwt::{
    ACCESS_TOKEN_DURATION_SECS, JwtConfig, JwtSettings, REFRESH_TOKEN_DURATION_SECS,
};
use clap::Parser;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "authserver",
    about = "JWT session service with an apps catalogue"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "authserver.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Issuer stamped into and required of every token
    #[arg(long, env = "JWT_ISSUER", default_value = "example.com")]
    pub jwt_issuer: String,

    /// Audience stamped into and required of every token
    #[arg(long, env = "JWT_AUDIENCE", default_value = "example.com")]
    pub jwt_audience: String,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TTL_SECS", default_value_t = ACCESS_TOKEN_DURATION_SECS)]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TTL_SECS", default_value_t = REFRESH_TOKEN_DURATION_SECS)]
    pub refresh_ttl_secs: u64,

    /// Name of the refresh token cookie
    #[arg(long, env = "COOKIE_NAME", default_value = REFRESH_COOKIE_NAME)]
    pub cookie_name: String,

    /// Domain of the refresh token cookie (not sent for __Host- cookies)
    #[arg(long, env = "COOKIE_DOMAIN", default_value = "localhost")]
    pub cookie_domain: String,

    /// Path of the refresh token cookie
    #[arg(long, env = "COOKIE_PATH", default_value = "/")]
    pub cookie_path: String,

    /// Comma-separated origins allowed to make credentialed requests
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Create a user with this email on startup. Password is read from CREATE_USER_PASSWORD
    #[arg(long)]
    pub create_user: Option<String>,

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

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
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

/// Token settings from the parsed arguments.
pub fn jwt_settings(args: &Args, jwt_secret: String) -> JwtSettings {
    JwtSettings {
        secret: jwt_secret.into_bytes(),
        issuer: args.jwt_issuer.clone(),
        audience: args.jwt_audience.clone(),
        access_ttl: Duration::from_secs(args.access_ttl_secs),
        refresh_ttl: Duration::from_secs(args.refresh_ttl_secs),
    }
}

/// Cookie settings from the parsed arguments.
pub fn cookie_settings(args: &Args) -> CookieSettings {
    CookieSettings {
        name: args.cookie_name.clone(),
        domain: args.cookie_domain.clone(),
        path: args.cookie_path.clone(),
    }
}

/// Handle the --create-user flag: create an active user unless the email is taken.
pub async fn handle_create_user(db: &Database, email: &str) {
    let password = match std::env::var("CREATE_USER_PASSWORD") {
        Ok(password) if !password.is_empty() => {
            // SAFETY: Same as JWT_SECRET, still single-threaded during startup.
            unsafe { std::env::remove_var("CREATE_USER_PASSWORD") };
            password
        }
        _ => {
            error!("--create-user requires the CREATE_USER_PASSWORD environment variable");
            std::process::exit(1);
        }
    };

    match db.users().get_by_email(email).await {
        Ok(Some(existing)) => {
            info!(user_id = existing.id, email = %email, "User already exists");
            return;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            std::process::exit(1);
        }
    }

    let hash = match tokio::task::spawn_blocking(move || hash_password(&password, HASH_COST)).await
    {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            error!(error = %e, "Failed to hash password");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Password hashing task failed");
            std::process::exit(1);
        }
    };

    let username = email.split('@').next().unwrap_or(email);
    match db.users().create(username, email, &hash).await {
        Ok(id) => info!(user_id = id, email = %email, "User created"),
        Err(e) => {
            error!(error = %e, "Failed to create user");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, jwt: JwtConfig) -> ServerConfig {
    ServerConfig {
        users: Arc::new(db.users()),
        db,
        jwt: Arc::new(jwt),
        cookies: cookie_settings(args),
        allowed_origins: args.allowed_origins.clone(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
