//! Placeholder substitution engine.
//!
//! Scans text left to right for non-overlapping `{{name}}` tokens and
//! rewrites each through the scope chain. Unresolved names are left verbatim
//! rather than replaced by an empty string, so a partially configured
//! environment cannot silently corrupt a request. Substituted values are
//! spliced in past the scan cursor and never re-scanned, which makes a
//! second pass over already-substituted output a no-op.

use crate::models::request::{FormDataParam, HttpRequest, RequestAuth, RequestBody};
use crate::variables::scope::ScopeChain;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Cached pattern for `{{ name }}` tokens with optional inner whitespace.
/// Compiled once and reused to avoid repeated regex compilation overhead.
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("Failed to compile placeholder regex"));

/// Renders a resolved value into placeholder output.
///
/// JSON strings render unquoted; every other value renders as its compact
/// JSON text (so `{{retries}}` bound to the number 3 becomes `3`, not `"3"`).
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replaces every resolvable `{{name}}` token in `text`.
///
/// Fail-soft: tokens whose name the chain cannot resolve are left exactly as
/// written. Idempotent on its own output as long as resolved values do not
/// themselves introduce new resolvable tokens.
///
/// # Examples
///
/// ```
/// use request_runner::project::{Folder, Project};
/// use request_runner::variables::scope::ScopeChain;
/// use request_runner::variables::store::{StoreKind, VariableStore};
/// use request_runner::variables::substitution::replace_in;
///
/// let project = Project::new(Folder::new("root"));
/// let mut runtime = VariableStore::new(StoreKind::Runtime);
/// runtime.set("host", "api.example.com");
///
/// let chain = ScopeChain::new(&project, &runtime, None, None);
/// assert_eq!(
///     replace_in("https://{{host}}/{{missing}}", &chain),
///     "https://api.example.com/{{missing}}"
/// );
/// ```
pub fn replace_in(text: &str, chain: &ScopeChain<'_>) -> String {
    // Fast path: no opening marker, nothing to do
    if !text.contains("{{") {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut last_match_end = 0;

    for cap in PLACEHOLDER_REGEX.captures_iter(text) {
        let full_match = cap.get(0).expect("capture 0 always present");
        let name = cap.get(1).expect("group 1 always present").as_str().trim();

        result.push_str(&text[last_match_end..full_match.start()]);

        match chain.get(name) {
            Some(value) => result.push_str(&render(value)),
            None => {
                log::debug!("unresolved placeholder '{{{{{}}}}}' left verbatim", name);
                result.push_str(full_match.as_str());
            }
        }

        last_match_end = full_match.end();
    }

    result.push_str(&text[last_match_end..]);
    result
}

/// Replaces placeholders in every string leaf of a JSON value, leaving the
/// structure untouched. Used for GraphQL variables.
fn replace_in_value(value: &mut Value, chain: &ScopeChain<'_>) {
    match value {
        Value::String(s) => *s = replace_in(s, chain),
        Value::Array(items) => {
            for item in items {
                replace_in_value(item, chain);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                replace_in_value(item, chain);
            }
        }
        _ => {}
    }
}

/// Applies placeholder substitution to every addressable text field of a
/// request: URL, header values, query and path variable values, the active
/// body variant, and auth credentials.
///
/// The request is expected to be a detached clone; the project tree is
/// never rewritten by substitution.
pub fn apply_to_request(request: &mut HttpRequest, chain: &ScopeChain<'_>) {
    request.url = replace_in(&request.url, chain);

    for header in &mut request.headers {
        header.value = replace_in(&header.value, chain);
    }
    for param in &mut request.query_params {
        param.value = replace_in(&param.value, chain);
    }
    for variable in &mut request.path_variables {
        variable.value = replace_in(&variable.value, chain);
    }

    match &mut request.body {
        RequestBody::None | RequestBody::BinaryBase64(_) => {}
        RequestBody::Plain(text)
        | RequestBody::Json(text)
        | RequestBody::Html(text)
        | RequestBody::Xml(text)
        | RequestBody::BinaryFile(text) => *text = replace_in(text, chain),
        RequestBody::FormData(params) => {
            for param in params {
                match param {
                    FormDataParam::Text { value, .. } => *value = replace_in(value, chain),
                    FormDataParam::File { file, .. } => *file = replace_in(file, chain),
                }
            }
        }
        RequestBody::UrlEncoded(params) => {
            for param in params {
                param.value = replace_in(&param.value, chain);
            }
        }
        RequestBody::GraphQl { query, variables } => {
            *query = replace_in(query, chain);
            if let Some(variables) = variables {
                replace_in_value(variables, chain);
            }
        }
    }

    match &mut request.auth {
        RequestAuth::Inherit | RequestAuth::None => {}
        RequestAuth::Basic { username, password } => {
            *username = replace_in(username, chain);
            *password = replace_in(password, chain);
        }
        RequestAuth::Bearer { token } => *token = replace_in(token, chain),
        RequestAuth::ApiKey { value, .. } => *value = replace_in(value, chain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::{HttpMethod, HttpRequest};
    use crate::project::{Folder, Project};
    use crate::variables::store::{StoreKind, VariableStore};
    use proptest::prelude::*;
    use serde_json::json;

    fn empty_project() -> Project {
        Project::new(Folder::new("root"))
    }

    fn runtime_with(values: &[(&str, Value)]) -> VariableStore {
        let mut store = VariableStore::new(StoreKind::Runtime);
        for (name, value) in values {
            store.set(*name, value.clone());
        }
        store
    }

    #[test]
    fn test_simple_substitution() {
        let project = empty_project();
        let rt = runtime_with(&[("baseUrl", json!("https://api.example.com"))]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        assert_eq!(
            replace_in("GET {{baseUrl}}/users", &chain),
            "GET https://api.example.com/users"
        );
    }

    #[test]
    fn test_unresolved_token_left_verbatim() {
        let project = empty_project();
        let rt = runtime_with(&[("a", json!("A"))]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        assert_eq!(replace_in("{{a}}-{{b}}", &chain), "A-{{b}}");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let project = empty_project();
        let rt = runtime_with(&[("a", json!("A")), ("n", json!(7))]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        let once = replace_in("{{a}}/{{n}}/{{missing}}", &chain);
        let twice = replace_in(&once, &chain);
        assert_eq!(once, "A/7/{{missing}}");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_substituted_values_are_not_reexpanded() {
        let project = empty_project();
        // outer's value contains a token that would itself resolve; a single
        // pass must not expand it
        let rt = runtime_with(&[("outer", json!("{{inner}}")), ("inner", json!("X"))]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        assert_eq!(replace_in("{{outer}}", &chain), "{{inner}}");
    }

    #[test]
    fn test_whitespace_inside_token_is_trimmed() {
        let project = empty_project();
        let rt = runtime_with(&[("host", json!("example.com"))]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        assert_eq!(replace_in("{{  host  }}", &chain), "example.com");
    }

    #[test]
    fn test_non_string_values_render_as_json() {
        let project = empty_project();
        let rt = runtime_with(&[
            ("count", json!(3)),
            ("on", json!(true)),
            ("obj", json!({"a": 1})),
        ]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        assert_eq!(
            replace_in("{{count}} {{on}} {{obj}}", &chain),
            r#"3 true {"a":1}"#
        );
    }

    #[test]
    fn test_no_tokens_fast_path() {
        let project = empty_project();
        let rt = runtime_with(&[]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        assert_eq!(replace_in("plain text", &chain), "plain text");
        assert_eq!(replace_in("", &chain), "");
    }

    #[test]
    fn test_repeated_token() {
        let project = empty_project();
        let rt = runtime_with(&[("v", json!("x"))]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        assert_eq!(replace_in("{{v}} and {{v}}", &chain), "x and x");
    }

    #[test]
    fn test_apply_to_request_touches_all_fields() {
        let project = empty_project();
        let rt = runtime_with(&[
            ("host", json!("api.example.com")),
            ("token", json!("t-123")),
            ("user", json!("alice")),
        ]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        let mut request = HttpRequest::new("login", HttpMethod::POST, "https://{{host}}/login");
        request
            .set_header("Authorization", "Bearer {{token}}")
            .add_query_param("u", "{{user}}")
            .set_body_json(r#"{"user": "{{user}}"}"#)
            .set_auth_basic("{{user}}", "{{token}}");
        request.set_path_variables(vec![("id".to_string(), "{{user}}".to_string())]);

        apply_to_request(&mut request, &chain);

        assert_eq!(request.url, "https://api.example.com/login");
        assert_eq!(request.header("authorization"), Some("Bearer t-123"));
        assert_eq!(request.query_params[0].value, "alice");
        assert_eq!(request.path_variables[0].value, "alice");
        assert_eq!(
            request.body,
            RequestBody::Json(r#"{"user": "alice"}"#.to_string())
        );
        assert_eq!(
            request.auth,
            RequestAuth::Basic {
                username: "alice".to_string(),
                password: "t-123".to_string()
            }
        );
    }

    #[test]
    fn test_apply_to_request_graphql_variables() {
        let project = empty_project();
        let rt = runtime_with(&[("id", json!("42"))]);
        let chain = ScopeChain::new(&project, &rt, None, None);

        let mut request = HttpRequest::new("gql", HttpMethod::POST, "https://example.com/graphql");
        request.set_body_graphql(
            "query($id: ID!) { user(id: $id) { name } }",
            Some(json!({"id": "{{id}}", "nested": {"also": "{{id}}"}})),
        );

        apply_to_request(&mut request, &chain);

        match &request.body {
            RequestBody::GraphQl { variables, .. } => {
                let variables = variables.as_ref().unwrap();
                assert_eq!(variables["id"], "42");
                assert_eq!(variables["nested"]["also"], "42");
            }
            other => panic!("Expected GraphQl body, got {:?}", other),
        }
    }

    proptest! {
        /// Applying replace_in twice always equals applying it once, for
        /// token-free values.
        #[test]
        fn prop_replace_in_is_idempotent(
            name in "[a-z]{1,8}",
            value in "[a-zA-Z0-9 ./:-]{0,24}",
            prefix in "[a-zA-Z0-9 /]{0,12}",
            suffix in "[a-zA-Z0-9 /]{0,12}",
        ) {
            let project = empty_project();
            let rt = runtime_with(&[(name.as_str(), json!(value))]);
            let chain = ScopeChain::new(&project, &rt, None, None);

            let text = format!("{}{{{{{}}}}}{} {{{{unbound}}}}", prefix, name, suffix);
            let once = replace_in(&text, &chain);
            let twice = replace_in(&once, &chain);
            prop_assert_eq!(once, twice);
        }
    }
}
