use hyper::header::AUTHORIZATION;
use hyper::http::HeaderMap;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    Missing,
    #[error("Invalid bearer token")]
    Invalid,
}

/// Checks the `Authorization` header against the configured token.
///
/// Both `Bearer <token>` and the bare token are accepted.
pub fn check_bearer(headers: &HeaderMap, expected: &str) -> Result<(), AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Missing)?
        .to_str()
        .map_err(|_| AuthError::Invalid)?
        .trim();

    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };

    if token.is_empty() || token.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Missing);
    }

    if constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::Invalid)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
