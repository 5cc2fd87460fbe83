//! Bearer token authentication (RFC 6750).

/// Builds the `Authorization` header value for a bearer token.
pub fn bearer_token(token: &str) -> String {
    format!("Bearer {}", token)
}
