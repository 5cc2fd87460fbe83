//! HTTP Basic authentication (RFC 7617).

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Builds the `Authorization` header value for Basic authentication:
/// `Basic base64(username:password)`.
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!("Basic {}", STANDARD.encode(credentials))
}
