//! Password hashing and session tokens.
//!
//! Password hashes are self-describing strings:
//!
//! ```text
//! pbkdf2-sha256$<iterations>$<salt, base64>$<hash, base64>
//! ```
//!
//! so that the iteration count can be raised without invalidating stored accounts. Session tokens
//! are random URL-safe strings; only their SHA-256 digest is kept by the store.

use crate::constants::{PASSWORD_HASH_LEN, PASSWORD_HASH_SCHEME, PASSWORD_SALT_LEN, SESSION_TOKEN_LEN};
use crate::{ClinicError, ClinicResult};
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0u8; PASSWORD_SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut hash = [0u8; PASSWORD_HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);

    format!(
        "{PASSWORD_HASH_SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check `password` against a stored hash string in constant time.
///
/// Returns `Ok(false)` for a wrong password and an error only when the stored string is not a
/// hash this module produced.
pub fn verify_password(password: &str, stored: &str) -> ClinicResult<bool> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(ClinicError::MalformedPasswordHash);
    };

    if scheme != PASSWORD_HASH_SCHEME {
        return Err(ClinicError::MalformedPasswordHash);
    }
    let iterations: u32 = iterations
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or(ClinicError::MalformedPasswordHash)?;
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| ClinicError::MalformedPasswordHash)?;
    let expected = STANDARD_NO_PAD
        .decode(expected)
        .map_err(|_| ClinicError::MalformedPasswordHash)?;
    if expected.is_empty() {
        return Err(ClinicError::MalformedPasswordHash);
    }

    let mut actual = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut actual);

    Ok(actual.ct_eq(&expected).into())
}

/// A new random session token, as handed to the client.
pub fn generate_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The digest under which a session token is stored.
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
