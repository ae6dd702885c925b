pub mod api;
pub mod auth;
pub mod cli;
pub mod cors;
pub mod db;
pub mod jwt;

use api::create_api_router;
use auth::{AuthService, CookieSettings, UserDirectory};
use axum::Router;
use db::Database;
use jwt::JwtConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Where login and refresh look users up
    pub users: Arc<dyn UserDirectory>,
    /// Token signer/verifier
    pub jwt: Arc<JwtConfig>,
    /// Name, domain and path of the refresh cookie
    pub cookies: CookieSettings,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<String>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let auth = AuthService::new(
        config.jwt.clone(),
        Arc::new(config.cookies.clone()),
        config.users.clone(),
    );

    create_api_router(config.db.clone(), auth)
        .layer(cors::cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
