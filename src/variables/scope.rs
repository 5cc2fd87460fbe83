//! Scope chain resolution.
//!
//! Given a variable name and an execution context (current folder, selected
//! environment group, runtime store), the chain consults an ordered list of
//! variable stores and returns the first match:
//!
//! 1. runtime store (set via `variables.set` during a run)
//! 2. local-default store of the nearest enclosing folder, walking from the
//!    current folder up to the root (nearest wins)
//! 3. shared-default store, same walk
//! 4. folder environment stores for the active environment of the selected
//!    group (local before shared at each folder), same walk
//! 5. global default store
//! 6. the selected group's active environment store
//!
//! Nearest-enclosing-folder-first gives lexical-style shadowing: a child
//! folder overrides an ancestor's defaults without mutating the ancestor,
//! and runtime writes are always immediately visible.

use crate::project::{FolderVariables, Project};
use crate::variables::store::VariableStore;
use serde_json::Value;

/// A borrowed view over every store the current context can see, in
/// precedence order. Cheap to build; build one per resolution site.
#[derive(Debug, Clone)]
pub struct ScopeChain<'a> {
    runtime: Option<&'a VariableStore>,
    /// Folder stores, nearest folder first.
    folders: Vec<&'a FolderVariables>,
    /// Selected group id and its active environment name, when both exist.
    env_binding: Option<(&'a str, &'a str)>,
    global_default: Option<&'a VariableStore>,
    global_env: Option<&'a VariableStore>,
}

impl<'a> ScopeChain<'a> {
    /// Builds the full chain for a run context.
    ///
    /// `folder_id` anchors the folder walk; an unknown or absent id yields a
    /// chain without folder stores. `group_id` selects the environment
    /// group, defaulting to the first configured group.
    pub fn new(
        project: &'a Project,
        runtime: &'a VariableStore,
        folder_id: Option<&str>,
        group_id: Option<&'a str>,
    ) -> Self {
        let mut chain = Self::folder_scope(project, folder_id, group_id);
        chain.runtime = Some(runtime);
        chain.global_default = Some(&project.globals.default);
        chain.global_env = project
            .selected_group(group_id)
            .and_then(|g| g.active_environment())
            .map(|e| &e.variables);
        chain
    }

    /// Builds a chain restricted to the folder walk (the `folderVariables`
    /// view): no runtime store, no globals.
    pub fn folder_scope(
        project: &'a Project,
        folder_id: Option<&str>,
        group_id: Option<&'a str>,
    ) -> Self {
        let folders = folder_id
            .and_then(|id| project.folder_chain(id))
            .map(|chain| {
                chain
                    .into_iter()
                    .rev()
                    .map(|folder| &folder.variables)
                    .collect()
            })
            .unwrap_or_default();

        let env_binding = project.selected_group(group_id).and_then(|group| {
            group
                .active_environment()
                .map(|env| (group.id.as_str(), env.name.as_str()))
        });

        Self {
            runtime: None,
            folders,
            env_binding,
            global_default: None,
            global_env: None,
        }
    }

    /// Builds a chain restricted to global stores (the `globals` view):
    /// global default, then the selected group's active environment store.
    pub fn global_scope(project: &'a Project, group_id: Option<&'a str>) -> Self {
        Self {
            runtime: None,
            folders: Vec::new(),
            env_binding: None,
            global_default: Some(&project.globals.default),
            global_env: project
                .selected_group(group_id)
                .and_then(|g| g.active_environment())
                .map(|e| &e.variables),
        }
    }

    /// Resolves a variable, returning the first match in precedence order,
    /// or `None` when no store in the chain holds the name.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        if let Some(value) = self.runtime.and_then(|store| store.get(name)) {
            return Some(value);
        }

        for variables in &self.folders {
            if let Some(value) = variables.local_default.get(name) {
                return Some(value);
            }
        }
        for variables in &self.folders {
            if let Some(value) = variables.shared_default.get(name) {
                return Some(value);
            }
        }
        if let Some((group_id, env_name)) = self.env_binding {
            for variables in &self.folders {
                if let Some(value) = variables
                    .local_env_store(group_id, env_name)
                    .and_then(|store| store.get(name))
                {
                    return Some(value);
                }
                if let Some(value) = variables
                    .shared_env_store(group_id, env_name)
                    .and_then(|store| store.get(name))
                {
                    return Some(value);
                }
            }
        }

        if let Some(value) = self.global_default.and_then(|store| store.get(name)) {
            return Some(value);
        }
        self.global_env.and_then(|store| store.get(name))
    }

    /// Checks whether any store in the chain holds the name.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Environment, EnvironmentGroup, Folder, Project};
    use crate::variables::store::StoreKind;
    use serde_json::json;

    /// root (f-root) > api (f-api) > admin (f-admin), one two-env group.
    fn build_project() -> Project {
        let mut admin = Folder::new("admin");
        admin.id = "f-admin".to_string();

        let mut api = Folder::new("api");
        api.id = "f-api".to_string();
        api.folders.push(admin);

        let mut root = Folder::new("root");
        root.id = "f-root".to_string();
        root.folders.push(api);

        let mut project = Project::new(root);
        project.environment_groups.push(EnvironmentGroup::new(
            "default",
            vec![Environment::new("dev"), Environment::new("prod")],
        ));
        project
    }

    fn runtime() -> VariableStore {
        VariableStore::new(StoreKind::Runtime)
    }

    #[test]
    fn test_runtime_wins_over_everything() {
        let mut project = build_project();
        project.globals.default.set("token", "global");
        project
            .folder_mut("f-admin")
            .unwrap()
            .variables
            .local_default
            .set("token", "folder");

        let mut rt = runtime();
        rt.set("token", "runtime");

        let chain = ScopeChain::new(&project, &rt, Some("f-admin"), None);
        assert_eq!(chain.get("token"), Some(&json!("runtime")));
    }

    #[test]
    fn test_nearest_folder_shadows_ancestors_and_globals() {
        let mut project = build_project();
        project.globals.default.set("base", "global");
        project
            .folder_mut("f-api")
            .unwrap()
            .variables
            .local_default
            .set("base", "api");
        project
            .folder_mut("f-admin")
            .unwrap()
            .variables
            .local_default
            .set("base", "admin");

        let rt = runtime();
        let chain = ScopeChain::new(&project, &rt, Some("f-admin"), None);
        assert_eq!(chain.get("base"), Some(&json!("admin")));

        // from the middle folder, its own value wins
        let chain = ScopeChain::new(&project, &rt, Some("f-api"), None);
        assert_eq!(chain.get("base"), Some(&json!("api")));

        // from the root, only the global remains
        let chain = ScopeChain::new(&project, &rt, Some("f-root"), None);
        assert_eq!(chain.get("base"), Some(&json!("global")));
    }

    #[test]
    fn test_local_default_wins_over_shared_default_anywhere_in_walk() {
        let mut project = build_project();
        // shared on the nearest folder, local on an ancestor: the local
        // walk completes before shared stores are consulted at all
        project
            .folder_mut("f-admin")
            .unwrap()
            .variables
            .shared_default
            .set("flavor", "shared-admin");
        project
            .folder_mut("f-api")
            .unwrap()
            .variables
            .local_default
            .set("flavor", "local-api");

        let rt = runtime();
        let chain = ScopeChain::new(&project, &rt, Some("f-admin"), None);
        assert_eq!(chain.get("flavor"), Some(&json!("local-api")));
    }

    #[test]
    fn test_folder_env_wins_over_globals_and_tracks_active_environment() {
        let mut project = build_project();
        project.globals.default.set("url", "global-default");
        project
            .folder_mut("f-api")
            .unwrap()
            .variables
            .local_env_store_mut("default", "dev")
            .set("url", "dev-url");

        let rt = runtime();
        let chain = ScopeChain::new(&project, &rt, Some("f-admin"), None);
        assert_eq!(chain.get("url"), Some(&json!("dev-url")));

        // switching the active environment unbinds the dev store
        project
            .selected_group_mut(None)
            .unwrap()
            .set_active("prod");
        let chain = ScopeChain::new(&project, &rt, Some("f-admin"), None);
        assert_eq!(chain.get("url"), Some(&json!("global-default")));
    }

    #[test]
    fn test_global_env_is_last_resort() {
        let mut project = build_project();
        project
            .selected_group_mut(None)
            .unwrap()
            .active_environment_mut()
            .unwrap()
            .variables
            .set("only-env", "from-env");

        let rt = runtime();
        let chain = ScopeChain::new(&project, &rt, Some("f-admin"), None);
        assert_eq!(chain.get("only-env"), Some(&json!("from-env")));

        project.globals.default.set("only-env", "from-default");
        let chain = ScopeChain::new(&project, &rt, Some("f-admin"), None);
        assert_eq!(chain.get("only-env"), Some(&json!("from-default")));
    }

    #[test]
    fn test_missing_name_and_has() {
        let project = build_project();
        let rt = runtime();
        let chain = ScopeChain::new(&project, &rt, Some("f-admin"), None);
        assert!(chain.get("nope").is_none());
        assert!(!chain.has("nope"));
    }

    #[test]
    fn test_explicit_group_selection() {
        let mut project = build_project();
        let mut second = EnvironmentGroup::new("region", vec![Environment::new("eu")]);
        second.environments[0].variables.set("dc", "eu-west");
        project.environment_groups.push(second);

        let rt = runtime();
        let chain = ScopeChain::new(&project, &rt, None, Some("region"));
        assert_eq!(chain.get("dc"), Some(&json!("eu-west")));

        // default group does not see the second group's values
        let chain = ScopeChain::new(&project, &rt, None, None);
        assert!(chain.get("dc").is_none());
    }

    #[test]
    fn test_folder_scope_excludes_runtime_and_globals() {
        let mut project = build_project();
        project.globals.default.set("g", "global");
        project
            .folder_mut("f-api")
            .unwrap()
            .variables
            .local_default
            .set("f", "folder");

        let chain = ScopeChain::folder_scope(&project, Some("f-admin"), None);
        assert_eq!(chain.get("f"), Some(&json!("folder")));
        assert!(chain.get("g").is_none());
    }

    #[test]
    fn test_global_scope_excludes_folders() {
        let mut project = build_project();
        project.globals.default.set("g", "global");
        project
            .folder_mut("f-api")
            .unwrap()
            .variables
            .local_default
            .set("f", "folder");

        let chain = ScopeChain::global_scope(&project, None);
        assert_eq!(chain.get("g"), Some(&json!("global")));
        assert!(chain.get("f").is_none());
    }
}
