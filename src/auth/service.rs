//! Login, refresh and logout.

use std::sync::Arc;

use axum::http::HeaderMap;

use super::cookie::{CookieSettings, SetCookie, get_cookie};
use super::credentials::verify_password;
use super::directory::{UserDirectory, UserRecord, with_timeout};
use super::errors::AuthError;
use crate::jwt::{JwtConfig, JwtUser, TokenPair};

/// Tokens to return in the body plus the cookie to set alongside them.
pub struct IssuedSession {
    pub tokens: TokenPair,
    pub cookie: SetCookie,
}

/// Issues and rotates token pairs for users found in a [`UserDirectory`].
#[derive(Clone)]
pub struct AuthService {
    jwt: Arc<JwtConfig>,
    cookies: Arc<CookieSettings>,
    users: Arc<dyn UserDirectory>,
}

impl AuthService {
    pub fn new(
        jwt: Arc<JwtConfig>,
        cookies: Arc<CookieSettings>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            jwt,
            cookies,
            users,
        }
    }

    pub fn jwt(&self) -> &Arc<JwtConfig> {
        &self.jwt
    }

    /// Check an email/password pair and issue a session for it.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let user = with_timeout(self.users.find_by_email(email)).await?;

        let matched =
            verify_password(password, user.as_ref().map(|u| u.password_hash.as_str())).await?;
        let user = user.ok_or(AuthError::UserNotFound)?;
        if !matched {
            return Err(AuthError::CredentialMismatch);
        }

        let session = self.issue(&user)?;
        tracing::info!(user_id = user.id, "User authenticated");
        Ok(session)
    }

    /// Exchange the refresh cookie for a new session.
    ///
    /// The user is looked up again so a deactivated or deleted account cannot
    /// keep refreshing on old claims.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<IssuedSession, AuthError> {
        let token = get_cookie(headers, &self.cookies.name)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingRefreshCookie)?;

        let claims = self.jwt.verify(token)?;

        let user = with_timeout(self.users.find_by_id(claims.user_id))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let session = self.issue(&user)?;
        tracing::debug!(user_id = user.id, "Session refreshed");
        Ok(session)
    }

    /// Cookie that removes the stored refresh token from the browser.
    pub fn logout_cookie(&self) -> SetCookie {
        self.cookies.expired_cookie()
    }

    fn issue(&self, user: &UserRecord) -> Result<IssuedSession, AuthError> {
        if !user.active {
            return Err(AuthError::InactiveUser);
        }

        let tokens = self.jwt.generate_token_pair(&JwtUser::from(user))?;
        let cookie = self
            .cookies
            .refresh_cookie(&tokens.refresh_token, self.jwt.refresh_ttl());

        Ok(IssuedSession { tokens, cookie })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::hash_password;
    use crate::auth::directory::InMemoryDirectory;
    use crate::jwt::JwtSettings;
    use axum::http::{HeaderValue, header};

    fn service() -> AuthService {
        let jwt = JwtConfig::new(&JwtSettings::new(
            b"service-test-secret".to_vec(),
            "example.com",
            "example.com",
        ))
        .unwrap();
        let users = InMemoryDirectory::new(vec![
            UserRecord {
                id: 1,
                email: "admin@example.com".to_string(),
                password_hash: hash_password("secret", 4).unwrap(),
                active: true,
            },
            UserRecord {
                id: 2,
                email: "retired@example.com".to_string(),
                password_hash: hash_password("secret", 4).unwrap(),
                active: false,
            },
        ]);
        AuthService::new(
            Arc::new(jwt),
            Arc::new(CookieSettings::default()),
            Arc::new(users),
        )
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("__Host-refresh_token={}", value)).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_pair() {
        let service = service();

        let session = service.login("admin@example.com", "secret").await.unwrap();

        let claims = service.jwt().verify(&session.tokens.access_token).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(session.cookie.value, session.tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_login_rejections() {
        let service = service();

        assert!(matches!(
            service.login("admin@example.com", "wrong").await,
            Err(AuthError::CredentialMismatch)
        ));
        assert!(matches!(
            service.login("nobody@example.com", "secret").await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            service.login("retired@example.com", "secret").await,
            Err(AuthError::InactiveUser)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_pair() {
        let service = service();
        let session = service.login("admin@example.com", "secret").await.unwrap();

        let refreshed = service
            .refresh(&cookie_headers(&session.tokens.refresh_token))
            .await
            .unwrap();

        let claims = service.jwt().verify(&refreshed.tokens.access_token).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(refreshed.cookie.value, refreshed.tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_rejections() {
        let service = service();

        assert!(matches!(
            service.refresh(&HeaderMap::new()).await,
            Err(AuthError::MissingRefreshCookie)
        ));
        assert!(matches!(
            service.refresh(&cookie_headers("")).await,
            Err(AuthError::MissingRefreshCookie)
        ));
        assert!(matches!(
            service.refresh(&cookie_headers("garbage")).await,
            Err(AuthError::MalformedToken)
        ));

        // Claims for a user id the directory no longer knows
        let stale = service
            .jwt()
            .issue_refresh_token(&JwtUser {
                id: 99,
                email: "gone@example.com".to_string(),
            })
            .unwrap();
        assert!(matches!(
            service.refresh(&cookie_headers(&stale)).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_password_check_yields_to_other_tasks() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let service = service();
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        for (email, password) in [
            ("admin@example.com", "secret"),
            ("admin@example.com", "wrong"),
            ("nobody@example.com", "secret"),
        ] {
            let before = ticks.load(Ordering::SeqCst);
            let _ = service.login(email, password).await;
            assert!(
                ticks.load(Ordering::SeqCst) > before,
                "{email} login never yielded"
            );
        }

        ticker.abort();
    }

    #[test]
    fn test_logout_cookie_expires() {
        let cookie = service().logout_cookie();
        assert_eq!(cookie.max_age, -1);
        assert!(cookie.value.is_empty());
    }
}
