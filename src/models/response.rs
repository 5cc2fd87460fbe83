//! HTTP response data model.
//!
//! A response is an immutable snapshot produced once per dispatched request.
//! Fields are private and exposed through accessors so nothing can mutate a
//! response after the transport constructed it.

use crate::models::request::Header;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parsed `Content-Type` of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    /// MIME type, e.g. `application/json`.
    pub mime_type: String,
    /// Charset parameter if present, e.g. `utf-8`.
    pub charset: Option<String>,
}

impl ContentType {
    /// Parses a `Content-Type` header value into its MIME type and optional
    /// charset parameter. Other parameters are ignored.
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split(';');
        let mime_type = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let charset = parts
            .map(|p| p.trim())
            .find_map(|p| p.strip_prefix("charset="))
            .map(|c| c.trim_matches('"').to_ascii_lowercase());
        Self { mime_type, charset }
    }

    /// Whether the MIME type is JSON (`application/json` or a `+json` suffix).
    pub fn is_json(&self) -> bool {
        self.mime_type == "application/json" || self.mime_type.ends_with("+json")
    }
}

/// Response headers as an ordered multiset with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeaders {
    headers: Vec<Header>,
}

impl ResponseHeaders {
    /// Creates the header set from an ordered list of entries.
    pub fn new(headers: Vec<Header>) -> Self {
        Self { headers }
    }

    /// Returns the first value of a header by name, or `None` if not present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Returns every value of a header by name, in response order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .collect()
    }

    /// Checks whether a header with the given name exists.
    pub fn has(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|h| h.name.eq_ignore_ascii_case(name))
    }

    /// All headers in response order.
    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    /// Number of header entries.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether there are no headers.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// An immutable snapshot of one HTTP response.
///
/// Constructed once by the transport; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    code: u16,
    status: String,
    headers: ResponseHeaders,
    elapsed: Duration,
    size: usize,
    content_type: Option<ContentType>,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response snapshot.
    ///
    /// The byte size (headers + body) and the parsed content type are derived
    /// here so every consumer sees the same values.
    pub fn new(
        code: u16,
        status: impl Into<String>,
        headers: Vec<Header>,
        elapsed: Duration,
        body: Vec<u8>,
    ) -> Self {
        let headers = ResponseHeaders::new(headers);
        let headers_size: usize = headers
            .iter()
            .map(|h| h.name.len() + h.value.len() + 4) // ": " + "\r\n"
            .sum();
        let content_type = headers.get("content-type").map(ContentType::parse);
        let size = headers_size + body.len();
        Self {
            code,
            status: status.into(),
            headers,
            elapsed,
            size,
            content_type,
            body,
        }
    }

    /// HTTP status code (e.g. 200, 404).
    pub fn code(&self) -> u16 {
        self.code
    }

    /// HTTP status text (e.g. "OK", "Not Found").
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    /// Time from dispatch to complete response.
    pub fn response_time(&self) -> Duration {
        self.elapsed
    }

    /// Time from dispatch to complete response, in whole milliseconds.
    pub fn response_time_millis(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Total response size in bytes (headers + body).
    pub fn response_size(&self) -> usize {
        self.size
    }

    /// Parsed content type, if the response carried one.
    pub fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    /// Raw body bytes.
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8 text, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Whether the status is informational (1xx).
    pub fn is_info(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// Whether the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Whether the status is a redirection (3xx).
    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// Whether the status is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code)
    }

    /// Whether the status is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.code)
    }
}
