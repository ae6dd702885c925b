//! Bearer token middleware for protected routes.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use super::errors::AuthError;
use crate::jwt::{Claims, JwtConfig};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    value
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

/// Reject the request with 401 unless it carries a valid bearer token.
///
/// On success the verified claims are stored in the request extensions and
/// the request is passed on; see [`Session`].
pub async fn require_bearer(
    State(jwt): State<Arc<JwtConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(request.headers())?;
    let claims = jwt.verify(token)?;

    tracing::debug!(user_id = claims.user_id, "Bearer token accepted");
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Claims of the caller, available on routes behind [`require_bearer`].
pub struct Session(pub Claims);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Session)
            .ok_or(AuthError::MissingHeader)
    }
}
