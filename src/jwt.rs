//! JWT token generation and validation.
//!
//! Access and refresh tokens share one claim shape and one HMAC secret; they
//! differ only in lifetime. Nothing links a refresh token to the access token
//! issued alongside it.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Access token duration: 15 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 15 * 60;

/// Refresh token duration: 24 hours
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 24 * 60 * 60;

/// Longest accepted token lifetime: 10 years
pub const MAX_TOKEN_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Algorithms accepted on verification. Tokens are always signed with HS256.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Identity a token pair is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtUser {
    pub id: i64,
    pub email: String,
}

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Database user ID
    pub user_id: i64,
    /// User email
    pub email: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Access and refresh token issued together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Immutable signing settings, read once at startup.
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: Vec<u8>,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtSettings {
    /// Settings with the default token lifetimes.
    pub fn new(secret: impl Into<Vec<u8>>, issuer: &str, audience: &str) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            access_ttl: Duration::from_secs(ACCESS_TOKEN_DURATION_SECS),
            refresh_ttl: Duration::from_secs(REFRESH_TOKEN_DURATION_SECS),
        }
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: u64,
    refresh_ttl: u64,
}

impl JwtConfig {
    /// Build the signer/verifier. Refuses an empty secret so a misconfigured
    /// server fails before it serves traffic.
    pub fn new(settings: &JwtSettings) -> Result<Self, TokenError> {
        if settings.secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let access_ttl = checked_ttl(settings.access_ttl)?;
        let refresh_ttl = checked_ttl(settings.refresh_ttl)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&settings.secret),
            decoding_key: DecodingKey::from_secret(&settings.secret),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Refresh token lifetime in seconds.
    pub fn refresh_ttl(&self) -> u64 {
        self.refresh_ttl
    }

    /// Generate a short-lived access token.
    pub fn issue_access_token(&self, user: &JwtUser) -> Result<String, TokenError> {
        self.sign(user, self.access_ttl)
    }

    /// Generate a long-lived refresh token.
    pub fn issue_refresh_token(&self, user: &JwtUser) -> Result<String, TokenError> {
        self.sign(user, self.refresh_ttl)
    }

    /// Generate an access/refresh pair for a user.
    pub fn generate_token_pair(&self, user: &JwtUser) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user)?,
            refresh_token: self.issue_refresh_token(user)?,
        })
    }

    fn sign(&self, user: &JwtUser, ttl: u64) -> Result<String, TokenError> {
        let now = unix_now()?;

        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now.checked_add(ttl).ok_or(TokenError::TimeError)?,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Validate and decode a token.
    ///
    /// Checks, in order: algorithm family, signature, expiry, audience, issuer.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        // A token is dead from the second named in `exp`, not one second later
        validation.reject_tokens_expiring_in_less_than = 1;
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "aud"]);

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(TokenError::from_decoding)?;

        if token_data.claims.iss != self.issuer {
            return Err(TokenError::IssuerMismatch);
        }

        Ok(token_data.claims)
    }
}

fn checked_ttl(ttl: Duration) -> Result<u64, TokenError> {
    match ttl.as_secs() {
        secs @ 1..=MAX_TOKEN_DURATION_SECS => Ok(secs),
        secs => Err(TokenError::InvalidTtl(secs)),
    }
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::TimeError)
}

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret must not be empty")]
    EmptySecret,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime of {0}s is outside 1..={max}s", max = MAX_TOKEN_DURATION_SECS)]
    InvalidTtl(u64),
    #[error("system time error")]
    TimeError,
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token uses an unexpected signing algorithm")]
    UnexpectedAlgorithm,
    #[error("token issuer does not match")]
    IssuerMismatch,
    #[error("token audience does not match")]
    AudienceMismatch,
    #[error("token is malformed")]
    Malformed,
}

impl TokenError {
    fn from_decoding(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
                TokenError::UnexpectedAlgorithm
            }
            ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
            ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
            _ => TokenError::Malformed,
        }
    }
}
