#![allow(dead_code)]

use std::sync::Arc;

use authserver::{
    ServerConfig,
    auth::{CookieSettings, hash_password},
    create_app,
    db::Database,
    jwt::{JwtConfig, JwtSettings, JwtUser},
};
use axum::{
    Router,
    body::Body,
    http::{Request, header},
    response::Response,
};
use tower::ServiceExt;

pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";
pub const TEST_ISSUER: &str = "example.com";
pub const TEST_ORIGIN: &str = "http://localhost:3000";
pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub fn test_settings() -> JwtSettings {
    JwtSettings::new(TEST_SECRET.to_vec(), TEST_ISSUER, TEST_ISSUER)
}

/// App backed by an in-memory database, with the database as user directory.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_origins(&[TEST_ORIGIN]).await
}

pub async fn create_test_app_with_origins(origins: &[&str]) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let jwt = Arc::new(JwtConfig::new(&test_settings()).unwrap());
    let config = ServerConfig {
        db: db.clone(),
        users: Arc::new(db.users()),
        jwt: jwt.clone(),
        cookies: CookieSettings::default(),
        allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
    };
    TestApp {
        app: create_app(&config),
        db,
        jwt,
    }
}

/// Create a user whose password is [`PASSWORD`]. Returns the user ID.
pub async fn create_user(db: &Database, email: &str, active: bool) -> i64 {
    let hash = hash_password(PASSWORD, 4).unwrap();
    let username = email.split('@').next().unwrap();
    let id = db.users().create(username, email, &hash).await.unwrap();
    if !active {
        db.users().set_active(id, false).await.unwrap();
    }
    id
}

pub fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/authenticate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "email": email, "password": password }).to_string(),
        ))
        .unwrap()
}

/// Access token for a user, signed with the test secret.
pub fn access_token(jwt: &JwtConfig, id: i64, email: &str) -> String {
    jwt.issue_access_token(&JwtUser {
        id,
        email: email.to_string(),
    })
    .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}
