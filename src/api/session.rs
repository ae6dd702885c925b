//! Session endpoints.
//!
//! - POST `/authenticate` - Exchange email/password for a token pair
//! - GET `/refresh` - Exchange the refresh cookie for a new token pair
//! - GET `/logout` - Clear the refresh cookie
//! - POST `/validatesession` - Check the bearer token

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use super::error::{ApiError, Envelope};
use crate::auth::{AuthService, IssuedSession, Session, require_bearer};

#[derive(Clone)]
pub struct SessionState {
    pub auth: AuthService,
}

pub fn router(state: SessionState) -> Router {
    let protected = Router::new()
        .route("/validatesession", post(validate_session))
        .route_layer(middleware::from_fn_with_state(
            state.auth.jwt().clone(),
            require_bearer,
        ));

    Router::new()
        .route("/authenticate", post(authenticate))
        .route("/refresh", get(refresh))
        .route("/logout", get(logout))
        .with_state(state)
        .merge(protected)
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Body plus refresh cookie for a freshly issued session.
fn session_response(status: StatusCode, session: IssuedSession) -> Response {
    let mut response = (status, Json(session.tokens)).into_response();
    session.cookie.append_to(response.headers_mut());
    response
}

async fn authenticate(
    State(state): State<SessionState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let session = state.auth.login(&req.email, &req.password).await?;
    Ok(session_response(StatusCode::ACCEPTED, session))
}

async fn refresh(
    State(state): State<SessionState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = state.auth.refresh(&headers).await?;
    Ok(session_response(StatusCode::OK, session))
}

async fn logout(State(state): State<SessionState>) -> Response {
    let mut response = StatusCode::ACCEPTED.into_response();
    state.auth.logout_cookie().append_to(response.headers_mut());
    response
}

async fn validate_session(Session(claims): Session) -> Json<Envelope> {
    tracing::trace!(user_id = claims.user_id, "Session validated");
    Json(Envelope::ok("session is valid"))
}
