//! Core data structures for HTTP requests and responses.

pub mod request;
pub mod response;

pub use request::{
    FormDataParam, Header, HttpMethod, HttpRequest, PathVariable, QueryParam, RequestAuth,
    RequestBody, UrlEncodedParam,
};
pub use response::{ContentType, HttpResponse, ResponseHeaders};
