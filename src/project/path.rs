//! Path-based folder and request addressing.
//!
//! A path is a `/`-separated chain of folder names ending, for request
//! paths, in a request name with an optional `METHOD:` prefix
//! (`/api/users/GET:list`). A leading `/` anchors the walk at the project
//! root; otherwise the walk starts at the context folder. Because `/` is
//! the separator, a literal `/` inside a folder or request name is matched
//! as `_`.
//!
//! Resolution never fails loudly: an unknown segment simply yields `None`,
//! and callers decide whether that is an error.

use crate::models::request::{HttpMethod, HttpRequest};
use crate::project::{Folder, Project};

/// Encodes one folder or request name for comparison against a path
/// segment: every literal `/` becomes `_`.
pub fn encode_segment(name: &str) -> String {
    name.replace('/', "_")
}

/// Splits an optional `METHOD:` prefix off a request segment.
///
/// The prefix is only honored when the text before the first colon parses
/// as an HTTP method; `v1:list` stays a plain name with a colon in it.
fn split_method(segment: &str) -> (Option<HttpMethod>, &str) {
    if let Some((prefix, rest)) = segment.split_once(':') {
        if let Some(method) = HttpMethod::from_str(prefix) {
            return (Some(method), rest);
        }
    }
    (None, segment)
}

/// Picks the anchor folder and the remaining segments for a path.
fn anchor<'a, 'p>(
    project: &'a Project,
    context_folder_id: Option<&str>,
    path: &'p str,
) -> Option<(&'a Folder, std::str::Split<'p, char>)> {
    if let Some(rest) = path.strip_prefix('/') {
        Some((&project.root, rest.split('/')))
    } else {
        let start = match context_folder_id {
            Some(id) => project.folder(id)?,
            None => &project.root,
        };
        Some((start, path.split('/')))
    }
}

fn child_folder<'a>(folder: &'a Folder, segment: &str) -> Option<&'a Folder> {
    folder
        .folders
        .iter()
        .find(|child| encode_segment(&child.name) == segment)
}

/// Resolves a folder path to the folder it names.
///
/// `/` and the empty relative path resolve to the anchor itself.
pub fn resolve_folder<'a>(
    project: &'a Project,
    context_folder_id: Option<&str>,
    path: &str,
) -> Option<&'a Folder> {
    let (mut current, segments) = anchor(project, context_folder_id, path)?;
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        current = child_folder(current, segment)?;
    }
    Some(current)
}

/// Resolves a request path to the request it names, together with its
/// enclosing folder (the folder anchors variable resolution for the
/// request).
///
/// When the final segment carries a `METHOD:` prefix, both the name and
/// the method must match; otherwise the first request with the name wins.
pub fn resolve_request<'a>(
    project: &'a Project,
    context_folder_id: Option<&str>,
    path: &str,
) -> Option<(&'a Folder, &'a HttpRequest)> {
    let (start, segments) = anchor(project, context_folder_id, path)?;

    let segments: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
    let (request_segment, folder_segments) = segments.split_last()?;

    let mut folder = start;
    for segment in folder_segments {
        folder = child_folder(folder, segment)?;
    }

    let (method, name) = split_method(request_segment);
    let request = folder.requests.iter().find(|request| {
        encode_segment(&request.name) == name && method.map_or(true, |m| request.method == m)
    })?;
    Some((folder, request))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// root > api > users, with GET and POST requests both named "list"
    /// under users, and an oddly named request at the root.
    fn build_project() -> Project {
        let mut users = Folder::new("users");
        users.id = "f-users".to_string();
        users
            .requests
            .push(HttpRequest::new("list", HttpMethod::GET, "/users"));
        users
            .requests
            .push(HttpRequest::new("list", HttpMethod::POST, "/users"));
        users
            .requests
            .push(HttpRequest::new("v1:detail", HttpMethod::GET, "/users/1"));

        let mut api = Folder::new("api");
        api.id = "f-api".to_string();
        api.folders.push(users);

        let mut root = Folder::new("root");
        root.id = "f-root".to_string();
        root.folders.push(api);
        root.requests
            .push(HttpRequest::new("health/live", HttpMethod::GET, "/healthz"));

        Project::new(root)
    }

    #[test]
    fn test_absolute_folder_path() {
        let project = build_project();
        assert_eq!(
            resolve_folder(&project, None, "/api/users").unwrap().id,
            "f-users"
        );
        assert_eq!(resolve_folder(&project, None, "/").unwrap().id, "f-root");
        assert!(resolve_folder(&project, None, "/api/nope").is_none());
    }

    #[test]
    fn test_relative_folder_path() {
        let project = build_project();
        assert_eq!(
            resolve_folder(&project, Some("f-api"), "users").unwrap().id,
            "f-users"
        );
        // relative paths ignore the context when the path is absolute
        assert_eq!(
            resolve_folder(&project, Some("f-users"), "/api").unwrap().id,
            "f-api"
        );
        assert!(resolve_folder(&project, Some("unknown"), "users").is_none());
    }

    #[test]
    fn test_request_by_name() {
        let project = build_project();
        let (folder, request) = resolve_request(&project, None, "/api/users/list").unwrap();
        assert_eq!(folder.id, "f-users");
        // without a method prefix the first declared match wins
        assert_eq!(request.method, HttpMethod::GET);
    }

    #[test]
    fn test_method_prefix_disambiguates() {
        let project = build_project();
        let (_, request) = resolve_request(&project, None, "/api/users/POST:list").unwrap();
        assert_eq!(request.method, HttpMethod::POST);
        assert!(resolve_request(&project, None, "/api/users/DELETE:list").is_none());
    }

    #[test]
    fn test_non_method_colon_is_part_of_the_name() {
        let project = build_project();
        let (_, request) = resolve_request(&project, None, "/api/users/v1:detail").unwrap();
        assert_eq!(request.name, "v1:detail");
    }

    #[test]
    fn test_slash_in_name_matches_as_underscore() {
        let project = build_project();
        let (_, request) = resolve_request(&project, None, "/health_live").unwrap();
        assert_eq!(request.name, "health/live");
    }

    #[test]
    fn test_relative_request_path() {
        let project = build_project();
        let (_, request) = resolve_request(&project, Some("f-users"), "GET:list").unwrap();
        assert_eq!(request.method, HttpMethod::GET);
        assert!(resolve_request(&project, Some("f-api"), "list").is_none());
    }
}
