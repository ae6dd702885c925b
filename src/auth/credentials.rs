//! Password hashing and verification.

use std::sync::LazyLock;

use super::errors::AuthError;

/// Work factor for newly stored hashes.
pub const HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, cost)
}

/// Compare a plaintext password against a stored bcrypt hash.
///
/// A mismatch is `Ok(false)`; an unparseable hash is an error.
pub fn password_matches(plain: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(plain, hash)
}

/// Checked when the email is unknown, so a miss costs as much as a wrong password.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("no such user", HASH_COST).unwrap_or_default());

/// Check a login attempt on the blocking pool.
///
/// `None` means the user does not exist: a dummy hash is checked instead and
/// the result is always `false`.
pub async fn verify_password(plain: &str, hash: Option<&str>) -> Result<bool, AuthError> {
    let plain = plain.to_owned();
    let hash = hash.map(str::to_owned);

    let matched = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => password_matches(&plain, &hash),
        None => {
            let _ = password_matches(&plain, &DUMMY_HASH);
            Ok(false)
        }
    })
    .await??;

    Ok(matched)
}
