//! HTTP request data model.
//!
//! This module defines the addressable, mutable description of one HTTP call:
//! method, URL, query parameters, path variables, headers, body, and auth.
//! All mutators follow a builder-style contract: they return `&mut Self` so
//! calls can be chained, and they are total over their declared input types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// HTTP request method.
///
/// Represents all standard HTTP methods as defined in RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
        }
    }

    /// Parses a string into an HttpMethod.
    ///
    /// Matching is case-insensitive. Returns `None` for anything that is not
    /// a recognized method, which is what lets the path resolver distinguish
    /// a `GET:` prefix from a literal colon inside a request name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single request header.
///
/// Headers form an ordered multiset: HTTP allows repeated header names, so
/// requests store `Vec<Header>` rather than a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name as authored (lookup is ASCII case-insensitive).
    pub name: String,
    /// Header value.
    pub value: String,
}

impl Header {
    /// Creates a new header.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single query parameter. Ordered multiset, like headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    pub key: String,
    pub value: String,
}

impl QueryParam {
    /// Creates a new query parameter.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A named path variable, expanded into `{key}` segments of the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathVariable {
    pub key: String,
    pub value: String,
}

/// One part of a multipart form body: either a text field or a file upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormDataParam {
    /// A text field with an optional explicit content type.
    Text {
        key: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
    /// A file field referencing a path on disk.
    File {
        key: String,
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
}

/// One key/value pair of a `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEncodedParam {
    pub key: String,
    pub value: String,
}

/// The request body as a tagged variant.
///
/// Exactly one variant is active at a time; every `set_body_*` mutator on
/// [`HttpRequest`] replaces whichever variant was previously set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestBody {
    /// No body is sent.
    None,
    /// Plain text (`text/plain` unless a Content-Type header overrides it).
    Plain(String),
    /// A JSON document, stored as raw text (`application/json`).
    Json(String),
    /// An HTML document (`text/html`).
    Html(String),
    /// An XML document (`application/xml`).
    Xml(String),
    /// Multipart form data (`multipart/form-data`).
    FormData(Vec<FormDataParam>),
    /// URL-encoded form (`application/x-www-form-urlencoded`).
    UrlEncoded(Vec<UrlEncodedParam>),
    /// Raw bytes read from a file at dispatch time.
    BinaryFile(String),
    /// Raw bytes supplied inline as base64 text, decoded at dispatch time.
    BinaryBase64(String),
    /// A GraphQL operation, serialized to `{"query": ..., "variables": ...}`
    /// JSON on the wire.
    GraphQl {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variables: Option<serde_json::Value>,
    },
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::None
    }
}

/// The request authentication as a tagged variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAuth {
    /// Use whatever auth the enclosing folder configures.
    Inherit,
    /// Send no credentials.
    None,
    /// HTTP Basic authentication (RFC 7617).
    Basic { username: String, password: String },
    /// Bearer token authentication (RFC 6750).
    Bearer { token: String },
    /// A named API key, sent either as a header or as a query parameter.
    ApiKey {
        key: String,
        value: String,
        in_header: bool,
    },
}

impl Default for RequestAuth {
    fn default() -> Self {
        RequestAuth::Inherit
    }
}

/// An addressable, mutable description of one HTTP call.
///
/// Requests are authored externally as part of the project tree and loaded
/// read-only; the orchestrator always works on detached clones, so builder
/// mutations performed by scripts never leak back into the tree.
///
/// # Examples
///
/// ```
/// use request_runner::models::request::{HttpMethod, HttpRequest};
///
/// let mut request = HttpRequest::new("login", HttpMethod::POST, "{{baseUrl}}/auth/login");
/// request
///     .set_header("Content-Type", "application/json")
///     .set_body_json(r#"{"user": "{{user}}"}"#)
///     .set_auth_bearer("{{token}}");
/// assert_eq!(request.method, HttpMethod::POST);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Unique identifier for this request within the project tree.
    #[serde(default = "generate_id")]
    pub id: String,

    /// Human-readable request name, used by path resolution.
    pub name: String,

    /// HTTP method.
    pub method: HttpMethod,

    /// Target URL. May contain `{{variable}}` placeholders and `{pathVar}`
    /// segments, both resolved before dispatch.
    pub url: String,

    /// Path variables expanded into `{key}` URL segments.
    #[serde(default)]
    pub path_variables: Vec<PathVariable>,

    /// Query parameters, appended to the URL at dispatch time.
    #[serde(default)]
    pub query_params: Vec<QueryParam>,

    /// Request headers as an ordered multiset.
    #[serde(default)]
    pub headers: Vec<Header>,

    /// Request body variant. Exactly one is active.
    #[serde(default)]
    pub body: RequestBody,

    /// Authentication variant. Exactly one is active.
    #[serde(default)]
    pub auth: RequestAuth,

    /// Script executed before the request is substituted and dispatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_request_script: Option<String>,

    /// Script executed against the response after dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_script: Option<String>,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl HttpRequest {
    /// Creates a new request with a generated id and no headers, body, or
    /// explicit auth (auth defaults to inherit-from-parent).
    pub fn new(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            method,
            url: url.into(),
            path_variables: Vec::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::None,
            auth: RequestAuth::Inherit,
            pre_request_script: None,
            test_script: None,
        }
    }

    /// Sets the HTTP method.
    pub fn set_method(&mut self, method: HttpMethod) -> &mut Self {
        self.method = method;
        self
    }

    /// Sets the target URL.
    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = url.into();
        self
    }

    /// Replaces all query parameters with the given set.
    pub fn set_query_params(
        &mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> &mut Self {
        self.query_params = params
            .into_iter()
            .map(|(k, v)| QueryParam::new(k, v))
            .collect();
        self
    }

    /// Replaces every query parameter with the given key by a single entry.
    ///
    /// If no parameter with the key exists, one is appended.
    pub fn set_query_param(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        let key = key.into();
        self.query_params.retain(|p| p.key != key);
        self.query_params.push(QueryParam::new(key, value));
        self
    }

    /// Appends a query parameter, preserving any existing entries with the
    /// same key.
    pub fn add_query_param(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.query_params.push(QueryParam::new(key, value));
        self
    }

    /// Removes all query parameters with the given key.
    pub fn remove_query_param(&mut self, key: &str) -> &mut Self {
        self.query_params.retain(|p| p.key != key);
        self
    }

    /// Replaces all path variables with the given set.
    pub fn set_path_variables(
        &mut self,
        variables: impl IntoIterator<Item = (String, String)>,
    ) -> &mut Self {
        self.path_variables = variables
            .into_iter()
            .map(|(key, value)| PathVariable { key, value })
            .collect();
        self
    }

    /// Replaces all headers with the given set.
    pub fn set_headers(
        &mut self,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> &mut Self {
        self.headers = headers
            .into_iter()
            .map(|(n, v)| Header::new(n, v))
            .collect();
        self
    }

    /// Replaces every header with the given name by a single entry.
    ///
    /// Name matching is ASCII case-insensitive; if no header with the name
    /// exists, one is appended.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.headers.retain(|h| !h.name.eq_ignore_ascii_case(&name));
        self.headers.push(Header::new(name, value));
        self
    }

    /// Appends a header, preserving any existing entries with the same name.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push(Header::new(name, value));
        self
    }

    /// Removes all headers with the given name (ASCII case-insensitive).
    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.retain(|h| !h.name.eq_ignore_ascii_case(name));
        self
    }

    /// Sets the body as plain text.
    pub fn set_body_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.body = RequestBody::Plain(text.into());
        self
    }

    /// Sets the body as a raw JSON document.
    pub fn set_body_json(&mut self, json: impl Into<String>) -> &mut Self {
        self.body = RequestBody::Json(json.into());
        self
    }

    /// Sets the body as JSON serialized from a value.
    pub fn set_body_json_value(&mut self, value: &serde_json::Value) -> &mut Self {
        self.body = RequestBody::Json(value.to_string());
        self
    }

    /// Sets the body as XML.
    pub fn set_body_xml(&mut self, xml: impl Into<String>) -> &mut Self {
        self.body = RequestBody::Xml(xml.into());
        self
    }

    /// Sets the body as HTML.
    pub fn set_body_html(&mut self, html: impl Into<String>) -> &mut Self {
        self.body = RequestBody::Html(html.into());
        self
    }

    /// Sets the body as a URL-encoded form.
    pub fn set_body_form_url_encoded(
        &mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> &mut Self {
        self.body = RequestBody::UrlEncoded(
            params
                .into_iter()
                .map(|(key, value)| UrlEncodedParam { key, value })
                .collect(),
        );
        self
    }

    /// Sets the body as multipart form data.
    pub fn set_body_multipart_form(&mut self, params: Vec<FormDataParam>) -> &mut Self {
        self.body = RequestBody::FormData(params);
        self
    }

    /// Sets the body to the contents of a file, read at dispatch time.
    pub fn set_body_file(&mut self, path: impl Into<String>) -> &mut Self {
        self.body = RequestBody::BinaryFile(path.into());
        self
    }

    /// Sets the body to raw bytes supplied as base64 text.
    pub fn set_body_base64(&mut self, encoded: impl Into<String>) -> &mut Self {
        self.body = RequestBody::BinaryBase64(encoded.into());
        self
    }

    /// Sets the body as a GraphQL operation.
    pub fn set_body_graphql(
        &mut self,
        query: impl Into<String>,
        variables: Option<serde_json::Value>,
    ) -> &mut Self {
        self.body = RequestBody::GraphQl {
            query: query.into(),
            variables,
        };
        self
    }

    /// Removes the request body.
    pub fn set_no_body(&mut self) -> &mut Self {
        self.body = RequestBody::None;
        self
    }

    /// Sets Basic authentication.
    pub fn set_auth_basic(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> &mut Self {
        self.auth = RequestAuth::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Sets Bearer token authentication.
    pub fn set_auth_bearer(&mut self, token: impl Into<String>) -> &mut Self {
        self.auth = RequestAuth::Bearer {
            token: token.into(),
        };
        self
    }

    /// Sets API-key authentication, sent as a header when `in_header` is
    /// true and as a query parameter otherwise.
    pub fn set_auth_api_key(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        in_header: bool,
    ) -> &mut Self {
        self.auth = RequestAuth::ApiKey {
            key: key.into(),
            value: value.into(),
            in_header,
        };
        self
    }

    /// Removes authentication entirely (no credentials are sent).
    pub fn set_no_auth(&mut self) -> &mut Self {
        self.auth = RequestAuth::None;
        self
    }

    /// Restores the default inherit-from-parent authentication.
    pub fn set_auth_inherit(&mut self) -> &mut Self {
        self.auth = RequestAuth::Inherit;
        self
    }

    /// Returns the first header value with the given name, matched ASCII
    /// case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Returns the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
