//! Authorization header parsing.

/// Errors raised while reading an `Authorization` header.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthHeaderError {
    #[error("authorization header must use the Bearer scheme")]
    UnsupportedScheme,
    #[error("bearer token is empty")]
    EmptyToken,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme name is matched case-insensitively.
pub fn bearer_token(header_value: &str) -> Result<&str, AuthHeaderError> {
    let (scheme, token) = header_value
        .trim_start()
        .split_once(' ')
        .ok_or(AuthHeaderError::UnsupportedScheme)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthHeaderError::UnsupportedScheme);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthHeaderError::EmptyToken);
    }

    Ok(token)
}
