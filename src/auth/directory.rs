//! User lookup used by login and refresh.
//!
//! The production implementation is the SQL user store (`db::UserStore`);
//! `InMemoryDirectory` backs tests that do not need a database.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::jwt::JwtUser;

/// Upper bound for a single user lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// The parts of a persisted user the auth layer reads.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub active: bool,
}

impl From<&UserRecord> for JwtUser {
    fn from(user: &UserRecord) -> Self {
        JwtUser {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("user lookup timed out")]
    Timeout,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, DirectoryError>;
}

/// Run a lookup, giving up after [`LOOKUP_TIMEOUT`].
pub async fn with_timeout<T, F>(lookup: F) -> Result<T, DirectoryError>
where
    F: Future<Output = Result<T, DirectoryError>>,
{
    tokio::time::timeout(LOOKUP_TIMEOUT, lookup)
        .await
        .map_err(|_| DirectoryError::Timeout)?
}

/// Fixed set of users held in memory. Emails match case-insensitively, like
/// the SQL store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: Vec<UserRecord>,
}

impl InMemoryDirectory {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }
}
