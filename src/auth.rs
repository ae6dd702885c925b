//! JWT session authentication.
//!
//! Login issues an access token (short-lived, sent back as a bearer token)
//! and a refresh token (long-lived, also stored in an HTTP-only cookie).
//! Protected routes only check the bearer token; `/refresh` trades the cookie
//! for a new pair. There is no server-side session store.

mod cookie;
mod credentials;
mod directory;
mod errors;
mod middleware;
mod service;

pub use cookie::{CookieSettings, REFRESH_COOKIE_NAME, SetCookie, get_cookie};
pub use credentials::{HASH_COST, hash_password, verify_password};
pub use directory::{
    DirectoryError, InMemoryDirectory, LOOKUP_TIMEOUT, UserDirectory, UserRecord, with_timeout,
};
pub use errors::AuthError;
pub use middleware::{Session, bearer_token, require_bearer};
pub use service::{AuthService, IssuedSession};
