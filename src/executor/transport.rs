//! HTTP transport: the seam between orchestration and the wire.
//!
//! [`HttpTransport`] is the trait the orchestrator dispatches through; tests
//! substitute a recording fake, production uses [`ReqwestTransport`]. The
//! transport receives fully substituted requests and owns the remaining
//! mechanical work: path-variable expansion, query assembly, body encoding,
//! and auth header construction.

use crate::auth;
use crate::models::request::{
    FormDataParam, HttpMethod, HttpRequest, PathVariable, RequestAuth, RequestBody,
};
use crate::models::response::HttpResponse;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use url::Url;

/// Errors that can occur while dispatching a request on the wire.
#[derive(Debug)]
pub enum TransportError {
    /// Connection failures, DNS resolution errors, and other network-level
    /// issues.
    Network(String),

    /// The request took longer than the configured timeout.
    Timeout,

    /// The URL could not be parsed or is malformed.
    InvalidUrl(String),

    /// Certificate validation errors, handshake failures, and other
    /// TLS-related issues.
    Tls(String),

    /// The request could not be constructed from the request data.
    Build(String),

    /// Only `http` and `https` URLs are dispatched.
    UnsupportedProtocol(String),

    /// A file-backed body could not be read.
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "Network error: {}", msg),
            TransportError::Timeout => write!(f, "Request timed out"),
            TransportError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            TransportError::Tls(msg) => write!(f, "TLS/SSL error: {}", msg),
            TransportError::Build(msg) => write!(f, "Request build error: {}", msg),
            TransportError::UnsupportedProtocol(protocol) => {
                write!(f, "Unsupported protocol: {}", protocol)
            }
            TransportError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() || err.is_request() {
            TransportError::Network(err.to_string())
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else if err.to_string().contains("certificate")
            || err.to_string().contains("TLS")
            || err.to_string().contains("SSL")
        {
            TransportError::Tls(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        TransportError::InvalidUrl(err.to_string())
    }
}

/// Dispatches one request and produces a response snapshot.
///
/// Implementations must not mutate shared state based on the request; the
/// orchestrator relies on dispatch being a pure request-in/response-out
/// operation.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns the complete response, or the first
    /// transport-level failure.
    async fn issue(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Expands `{key}` path-variable segments in a URL.
fn expand_path_variables(url: &str, variables: &[PathVariable]) -> String {
    let mut expanded = url.to_string();
    for variable in variables {
        expanded = expanded.replace(&format!("{{{}}}", variable.key), &variable.value);
    }
    expanded
}

/// Expands path variables and validates that the result is a well-formed
/// `http` or `https` URL.
fn validated_url(url: &str, variables: &[PathVariable]) -> Result<Url, TransportError> {
    let expanded = expand_path_variables(url, variables);
    let parsed = Url::parse(&expanded)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(TransportError::UnsupportedProtocol(other.to_string())),
    }
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// The production transport, backed by a shared [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a 30 second timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a transport with an explicit timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    /// Attaches the body variant to the request builder.
    ///
    /// Returns the content type to apply when the request does not set one
    /// explicitly. Multipart bodies return `None`: reqwest generates the
    /// boundary-carrying content type itself.
    fn apply_body(
        builder: reqwest::RequestBuilder,
        body: &RequestBody,
    ) -> Result<(reqwest::RequestBuilder, Option<&'static str>), TransportError> {
        let applied = match body {
            RequestBody::None => (builder, None),
            RequestBody::Plain(text) => (builder.body(text.clone()), Some("text/plain")),
            RequestBody::Json(text) => (builder.body(text.clone()), Some("application/json")),
            RequestBody::Html(text) => (builder.body(text.clone()), Some("text/html")),
            RequestBody::Xml(text) => (builder.body(text.clone()), Some("application/xml")),
            RequestBody::UrlEncoded(params) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter().map(|p| (&p.key, &p.value)))
                    .finish();
                (
                    builder.body(encoded),
                    Some("application/x-www-form-urlencoded"),
                )
            }
            RequestBody::FormData(params) => {
                let mut form = reqwest::multipart::Form::new();
                for param in params {
                    match param {
                        FormDataParam::Text {
                            key,
                            value,
                            content_type,
                        } => {
                            let mut part = reqwest::multipart::Part::text(value.clone());
                            if let Some(content_type) = content_type {
                                part = part
                                    .mime_str(content_type)
                                    .map_err(|e| TransportError::Build(e.to_string()))?;
                            }
                            form = form.part(key.clone(), part);
                        }
                        FormDataParam::File {
                            key,
                            file,
                            content_type,
                        } => {
                            let bytes = std::fs::read(file).map_err(|e| {
                                TransportError::Io(format!("{}: {}", file, e))
                            })?;
                            let mut part = reqwest::multipart::Part::bytes(bytes)
                                .file_name(file_name_of(file));
                            if let Some(content_type) = content_type {
                                part = part
                                    .mime_str(content_type)
                                    .map_err(|e| TransportError::Build(e.to_string()))?;
                            }
                            form = form.part(key.clone(), part);
                        }
                    }
                }
                (builder.multipart(form), None)
            }
            RequestBody::BinaryFile(path) => {
                let bytes = std::fs::read(path)
                    .map_err(|e| TransportError::Io(format!("{}: {}", path, e)))?;
                (builder.body(bytes), Some("application/octet-stream"))
            }
            RequestBody::BinaryBase64(encoded) => {
                let bytes = STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| TransportError::Build(format!("invalid base64 body: {}", e)))?;
                (builder.body(bytes), Some("application/octet-stream"))
            }
            RequestBody::GraphQl { query, variables } => {
                let mut payload = serde_json::json!({ "query": query });
                if let Some(variables) = variables {
                    payload["variables"] = variables.clone();
                }
                (
                    builder.body(payload.to_string()),
                    Some("application/json"),
                )
            }
        };
        Ok(applied)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn issue(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = validated_url(&request.url, &request.path_variables)?;

        let method = match request.method {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
            HttpMethod::HEAD => reqwest::Method::HEAD,
        };

        let mut builder = self.client.request(method, url);

        if !request.query_params.is_empty() {
            let pairs: Vec<(&str, &str)> = request
                .query_params
                .iter()
                .map(|p| (p.key.as_str(), p.value.as_str()))
                .collect();
            builder = builder.query(&pairs);
        }
        if let RequestAuth::ApiKey {
            key,
            value,
            in_header: false,
        } = &request.auth
        {
            builder = builder.query(&[(key.as_str(), value.as_str())]);
        }

        for header in &request.headers {
            builder = builder.header(&header.name, &header.value);
        }
        if let Some(header) = auth::authorization_header(&request.auth) {
            builder = builder.header(&header.name, &header.value);
        }

        let (mut builder, default_content_type) = Self::apply_body(builder, &request.body)?;
        if let Some(content_type) = default_content_type {
            if request.content_type().is_none() {
                builder = builder.header("Content-Type", content_type);
            }
        }

        let start = Instant::now();
        let response = builder.send().await.map_err(TransportError::from)?;

        let code = response.status().as_u16();
        let status = response
            .status()
            .canonical_reason()
            .unwrap_or("")
            .to_string();

        let mut headers = Vec::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.push(crate::models::request::Header::new(name.as_str(), value));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(TransportError::from)?
            .to_vec();
        let elapsed = start.elapsed();

        Ok(HttpResponse::new(code, status, headers, elapsed, body))
    }
}
