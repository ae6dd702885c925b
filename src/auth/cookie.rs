//! Refresh token cookie construction and parsing.

use std::fmt;

use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{DateTime, Duration, Utc};

/// Default cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "__Host-refresh_token";

/// Browsers reject `__Host-` cookies that carry a Domain attribute or a
/// Path other than `/`.
const HOST_PREFIX: &str = "__Host-";

/// Where the refresh cookie lives in the browser.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub domain: String,
    pub path: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            name: REFRESH_COOKIE_NAME.to_string(),
            domain: "localhost".to_string(),
            path: "/".to_string(),
        }
    }
}


/// A `Set-Cookie` value.
#[derive(Debug, Clone)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: String,
    /// Negative means "delete now"; rendered as `Max-Age=0`.
    pub max_age: i64,
    pub expires: DateTime<Utc>,
    pub http_only: bool,
    pub secure: bool,
}

impl SetCookie {
    /// Append this cookie to a response's headers.
    pub fn append_to(&self, headers: &mut HeaderMap) {
        match HeaderValue::from_str(&self.to_string()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!(cookie = %self.name, error = %e, "Invalid cookie header"),
        }
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; Path={}", self.name, self.value, self.path)?;
        if !self.domain.is_empty() && !self.name.starts_with(HOST_PREFIX) {
            write!(f, "; Domain={}", self.domain)?;
        }
        write!(
            f,
            "; Expires={}; Max-Age={}",
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.max_age.max(0)
        )?;
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        f.write_str("; SameSite=Strict")
    }
}

impl CookieSettings {
    /// The configured path, except `__Host-` cookies which must use `/`.
    fn cookie_path(&self) -> String {
        if self.name.starts_with(HOST_PREFIX) {
            "/".to_string()
        } else {
            self.path.clone()
        }
    }

    /// Cookie carrying a freshly issued refresh token.
    pub fn refresh_cookie(&self, token: &str, ttl_secs: u64) -> SetCookie {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        SetCookie {
            name: self.name.clone(),
            value: token.to_string(),
            path: self.cookie_path(),
            domain: self.domain.clone(),
            max_age: ttl,
            expires: Duration::try_seconds(ttl)
                .and_then(|d| Utc::now().checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            http_only: true,
            secure: true,
        }
    }

    /// Cookie that overwrites the stored refresh token and expires it at once.
    pub fn expired_cookie(&self) -> SetCookie {
        SetCookie {
            name: self.name.clone(),
            value: String::new(),
            path: self.cookie_path(),
            domain: self.domain.clone(),
            max_age: -1,
            expires: DateTime::<Utc>::UNIX_EPOCH,
            http_only: true,
            secure: true,
        }
    }
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            if let Some((key, value)) = part.trim().split_once('=') {
                if key.trim() == name {
                    return Some(value.trim());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CookieSettings {
        CookieSettings {
            name: "refresh_token".to_string(),
            domain: "example.com".to_string(),
            path: "/".to_string(),
        }
    }

    #[test]
    fn test_get_cookie_multiple() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; __Host-refresh_token=xyz789"),
        );

        assert_eq!(get_cookie(&headers, REFRESH_COOKIE_NAME), Some("xyz789"));
        assert_eq!(get_cookie(&headers, "foo"), Some("bar"));
        assert_eq!(get_cookie(&headers, "other"), None);
    }

    #[test]
    fn test_get_cookie_no_header() {
        let headers = HeaderMap::new();
        assert_eq!(get_cookie(&headers, REFRESH_COOKIE_NAME), None);
    }

    #[test]
    fn test_get_cookie_with_spaces() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("  refresh_token = abc123  ; foo=bar"),
        );

        assert_eq!(get_cookie(&headers, "refresh_token"), Some("abc123"));
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = settings().refresh_cookie("tok", 3600);

        assert_eq!(cookie.value, "tok");
        assert_eq!(cookie.max_age, 3600);
        assert!(cookie.http_only && cookie.secure);
        assert!(cookie.expires > Utc::now());

        let rendered = cookie.to_string();
        assert!(rendered.starts_with("refresh_token=tok; Path=/; Domain=example.com; Expires="));
        assert!(rendered.contains("Max-Age=3600"));
        assert!(rendered.ends_with("; HttpOnly; Secure; SameSite=Strict"));
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = settings().expired_cookie();

        assert_eq!(cookie.max_age, -1);
        assert!(cookie.value.is_empty());
        assert_eq!(cookie.expires, DateTime::<Utc>::UNIX_EPOCH);

        let rendered = cookie.to_string();
        assert!(rendered.starts_with("refresh_token=; Path=/; Domain=example.com"));
        assert!(rendered.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(rendered.contains("Max-Age=0"));
    }

    #[test]
    fn test_host_prefixed_cookie_has_no_domain() {
        let settings = CookieSettings::default();

        let rendered = settings.refresh_cookie("tok", 60).to_string();

        assert!(rendered.starts_with("__Host-refresh_token=tok; Path=/; Expires="));
        assert!(!rendered.contains("Domain="));
    }

    #[test]
    fn test_path_shared_by_set_and_expire() {
        let custom = CookieSettings {
            path: "/auth".to_string(),
            ..settings()
        };
        assert_eq!(custom.refresh_cookie("tok", 60).path, "/auth");
        assert_eq!(custom.expired_cookie().path, "/auth");

        let host = CookieSettings {
            path: "/auth".to_string(),
            ..CookieSettings::default()
        };
        assert_eq!(host.refresh_cookie("tok", 60).path, "/");
        assert_eq!(host.expired_cookie().path, "/");
    }
}
