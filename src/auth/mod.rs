//! Authentication header construction.
//!
//! Credentials are substituted like any other request field before this
//! module runs, so the values arriving here are final.

pub mod basic;
pub mod bearer;

use crate::models::request::{Header, RequestAuth};

/// Builds the header an auth variant contributes to the outgoing request.
///
/// Returns `None` for variants that add no header: no auth, inherited auth
/// (resolved by the caller before dispatch), and API keys sent as query
/// parameters.
pub fn authorization_header(auth: &RequestAuth) -> Option<Header> {
    match auth {
        RequestAuth::Inherit | RequestAuth::None => None,
        RequestAuth::Basic { username, password } => Some(Header::new(
            "Authorization",
            basic::basic_auth(username, password),
        )),
        RequestAuth::Bearer { token } => {
            Some(Header::new("Authorization", bearer::bearer_token(token)))
        }
        RequestAuth::ApiKey {
            key,
            value,
            in_header,
        } => {
            if *in_header {
                Some(Header::new(key.clone(), value.clone()))
            } else {
                None
            }
        }
    }
}
