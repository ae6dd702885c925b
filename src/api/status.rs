use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Status {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

/// GET `/` liveness check.
pub async fn home() -> Json<Status> {
    Json(Status {
        status: "active",
        message: "authserver up and running",
        version: env!("CARGO_PKG_VERSION"),
    })
}
