//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::directory::DirectoryError;
use crate::api::Envelope;
use crate::jwt::TokenError;

/// Every way a login, refresh, or bearer check can fail.
///
/// The variant is only logged; clients get a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,
    #[error("Authorization header is not a bearer token")]
    MalformedHeader,
    #[error("missing refresh token cookie")]
    MissingRefreshCookie,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("unexpected signing algorithm")]
    UnexpectedAlgorithm,
    #[error("token expired")]
    ExpiredToken,
    #[error("token issuer mismatch")]
    IssuerMismatch,
    #[error("token audience mismatch")]
    AudienceMismatch,
    #[error("malformed token")]
    MalformedToken,
    #[error("user not found")]
    UserNotFound,
    #[error("user is not active")]
    InactiveUser,
    #[error("password does not match")]
    CredentialMismatch,
    #[error("failed to sign token: {0}")]
    SigningFailure(#[source] TokenError),
    #[error("user lookup failed: {0}")]
    LookupFailure(#[from] DirectoryError),
    #[error("password hash check failed: {0}")]
    HashFailure(#[from] bcrypt::BcryptError),
    #[error("password check task failed: {0}")]
    TaskFailure(#[from] tokio::task::JoinError),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::UnexpectedAlgorithm => AuthError::UnexpectedAlgorithm,
            TokenError::IssuerMismatch => AuthError::IssuerMismatch,
            TokenError::AudienceMismatch => AuthError::AudienceMismatch,
            TokenError::Malformed => AuthError::MalformedToken,
            TokenError::EmptySecret
            | TokenError::InvalidTtl(_)
            | TokenError::Signing(_)
            | TokenError::TimeError => AuthError::SigningFailure(e),
        }
    }
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::SigningFailure(_)
            | AuthError::LookupFailure(_)
            | AuthError::HashFailure(_)
            | AuthError::TaskFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::UserNotFound | AuthError::InactiveUser | AuthError::CredentialMismatch => {
                "invalid credentials"
            }
            AuthError::SigningFailure(_)
            | AuthError::LookupFailure(_)
            | AuthError::HashFailure(_)
            | AuthError::TaskFailure(_) => "internal server error",
            _ => "unauthorized",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Authentication error");
        } else {
            tracing::debug!(reason = %self, "Authentication rejected");
        }

        (status, Json(Envelope::error(self.message()))).into_response()
    }
}
