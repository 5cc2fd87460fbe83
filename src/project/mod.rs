//! Project tree data: folders, requests, environment groups, and suites.
//!
//! Projects are authored externally and loaded read-only; the only mutation
//! this core performs on them is through the variable set/unset/clear
//! operations exposed to scripts. The folder tree is an ownership tree, so
//! the structural invariants (exactly one root, no cycles, parent/child
//! consistency) hold by construction; parent access is derived via
//! [`Project::parent_of`] instead of a stored back-reference.

pub mod path;

use crate::models::request::HttpRequest;
use crate::variables::store::{StoreKind, VariableStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A named variable store bound to one entry of an environment group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Environment name (e.g. "dev", "staging", "production").
    pub name: String,
    /// Environment-kind variables. For a group configured at the project
    /// level these are the *global* environment stores.
    pub variables: VariableStore,
}

impl Environment {
    /// Creates an empty environment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: VariableStore::new(StoreKind::Environment),
        }
    }
}

/// An ordered set of mutually exclusive environments, one of which is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentGroup {
    /// Group identifier, referenced by `envGroupId`-style arguments.
    pub id: String,
    /// The environments in declared order.
    pub environments: Vec<Environment>,
    /// Index of the active environment within `environments`.
    #[serde(default)]
    active_index: usize,
}

impl EnvironmentGroup {
    /// Creates a group with the given environments; the first is active.
    pub fn new(id: impl Into<String>, environments: Vec<Environment>) -> Self {
        Self {
            id: id.into(),
            environments,
            active_index: 0,
        }
    }

    /// The currently active environment, if the group has any.
    pub fn active_environment(&self) -> Option<&Environment> {
        self.environments.get(self.active_index)
    }

    /// Mutable access to the active environment.
    pub fn active_environment_mut(&mut self) -> Option<&mut Environment> {
        self.environments.get_mut(self.active_index)
    }

    /// Activates the environment at `index`. Returns false (and leaves the
    /// group unchanged) when the index is out of range.
    pub fn set_active_index(&mut self, index: usize) -> bool {
        if index < self.environments.len() {
            self.active_index = index;
            true
        } else {
            false
        }
    }

    /// Activates the environment with the given name. Returns false when no
    /// environment has that name.
    pub fn set_active(&mut self, name: &str) -> bool {
        match self.environments.iter().position(|e| e.name == name) {
            Some(index) => {
                self.active_index = index;
                true
            }
            None => false,
        }
    }
}

/// Global variable stores. Only `default` lives here: global
/// environment-kind values are the environment stores of the project's
/// groups, bound through whichever environment is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariables {
    /// Environment-independent global defaults.
    pub default: VariableStore,
}

impl Default for GlobalVariables {
    fn default() -> Self {
        Self {
            default: VariableStore::new(StoreKind::Default),
        }
    }
}

/// The variable stores a folder owns.
///
/// Environment stores are keyed by environment group id, then by environment
/// name, and are created lazily on first write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderVariables {
    /// Environment-independent defaults, not shared.
    pub local_default: VariableStore,
    /// Environment-independent defaults, shared.
    pub shared_default: VariableStore,
    #[serde(default)]
    local_env: HashMap<String, HashMap<String, VariableStore>>,
    #[serde(default)]
    shared_env: HashMap<String, HashMap<String, VariableStore>>,
}

impl Default for FolderVariables {
    fn default() -> Self {
        Self {
            local_default: VariableStore::new(StoreKind::LocalDefault),
            shared_default: VariableStore::new(StoreKind::SharedDefault),
            local_env: HashMap::new(),
            shared_env: HashMap::new(),
        }
    }
}

impl FolderVariables {
    /// Creates an empty set of folder stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// The folder's local environment store for a group/environment pair.
    pub fn local_env_store(&self, group_id: &str, env_name: &str) -> Option<&VariableStore> {
        self.local_env.get(group_id).and_then(|m| m.get(env_name))
    }

    /// The folder's shared environment store for a group/environment pair.
    pub fn shared_env_store(&self, group_id: &str, env_name: &str) -> Option<&VariableStore> {
        self.shared_env.get(group_id).and_then(|m| m.get(env_name))
    }

    /// Mutable local environment store, created on demand.
    pub fn local_env_store_mut(&mut self, group_id: &str, env_name: &str) -> &mut VariableStore {
        self.local_env
            .entry(group_id.to_string())
            .or_default()
            .entry(env_name.to_string())
            .or_insert_with(|| VariableStore::new(StoreKind::Environment))
    }

    /// Mutable shared environment store, created on demand.
    pub fn shared_env_store_mut(&mut self, group_id: &str, env_name: &str) -> &mut VariableStore {
        self.shared_env
            .entry(group_id.to_string())
            .or_default()
            .entry(env_name.to_string())
            .or_insert_with(|| VariableStore::new(StoreKind::Environment))
    }

    /// Clears every local store, default and environment-specific.
    pub fn clear_local(&mut self) {
        self.local_default.clear();
        self.local_env.clear();
    }

    /// Clears every shared store, default and environment-specific.
    pub fn clear_shared(&mut self) {
        self.shared_default.clear();
        self.shared_env.clear();
    }
}

/// A node of the project tree: nested folders, requests in declared order,
/// and the folder's own variable stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique identifier within the project.
    #[serde(default = "generate_id")]
    pub id: String,
    /// Folder name, used by path resolution.
    pub name: String,
    /// Child folders in declared order.
    #[serde(default)]
    pub folders: Vec<Folder>,
    /// Requests in declared order.
    #[serde(default)]
    pub requests: Vec<HttpRequest>,
    /// The folder's variable stores.
    #[serde(default)]
    pub variables: FolderVariables,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl Folder {
    /// Creates an empty folder with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            folders: Vec::new(),
            requests: Vec::new(),
            variables: FolderVariables::new(),
        }
    }
}

/// One step of a test suite: a folder or request reference by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStep {
    /// Run every request under the folder at this path.
    Folder(String),
    /// Run the single request at this path.
    Request(String),
}

/// An ordered sequence of folder/request references with its own pass/fail
/// aggregation when executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    /// Unique identifier within the project.
    #[serde(default = "generate_id")]
    pub id: String,
    /// Suite name.
    pub name: String,
    /// Steps in declared order.
    #[serde(default)]
    pub steps: Vec<SuiteStep>,
}

/// The whole project: one root folder, environment groups, global variable
/// stores, and test suites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// The single root of the folder tree.
    pub root: Folder,
    /// Environment groups in declared order; the first is the default group.
    #[serde(default)]
    pub environment_groups: Vec<EnvironmentGroup>,
    /// Global variable stores.
    #[serde(default)]
    pub globals: GlobalVariables,
    /// Test suites.
    #[serde(default)]
    pub suites: Vec<TestSuite>,
}

impl Project {
    /// Creates a project around a root folder, with no groups or suites.
    pub fn new(root: Folder) -> Self {
        Self {
            root,
            environment_groups: Vec::new(),
            globals: GlobalVariables::default(),
            suites: Vec::new(),
        }
    }

    /// Loads a project from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Finds a folder by id anywhere in the tree.
    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folder_chain(id)
            .and_then(|chain| chain.last().copied())
    }

    /// Mutable lookup of a folder by id.
    pub fn folder_mut(&mut self, id: &str) -> Option<&mut Folder> {
        fn walk<'a>(folder: &'a mut Folder, id: &str) -> Option<&'a mut Folder> {
            if folder.id == id {
                return Some(folder);
            }
            folder.folders.iter_mut().find_map(|child| walk(child, id))
        }
        walk(&mut self.root, id)
    }

    /// The chain of folders from the root down to the folder with the given
    /// id (inclusive), or `None` if no such folder exists.
    ///
    /// The scope chain walks this in reverse: nearest folder first.
    pub fn folder_chain(&self, id: &str) -> Option<Vec<&Folder>> {
        fn walk<'a>(folder: &'a Folder, id: &str) -> Option<Vec<&'a Folder>> {
            if folder.id == id {
                return Some(vec![folder]);
            }
            for child in &folder.folders {
                if let Some(mut chain) = walk(child, id) {
                    chain.insert(0, folder);
                    return Some(chain);
                }
            }
            None
        }
        walk(&self.root, id)
    }

    /// The parent of the folder with the given id, or `None` for the root
    /// and for unknown ids.
    pub fn parent_of(&self, id: &str) -> Option<&Folder> {
        let chain = self.folder_chain(id)?;
        if chain.len() < 2 {
            return None;
        }
        chain.get(chain.len() - 2).copied()
    }

    /// The first configured environment group, used wherever a group id is
    /// omitted.
    pub fn default_group(&self) -> Option<&EnvironmentGroup> {
        self.environment_groups.first()
    }

    /// Selects a group by id, falling back to the default group when the id
    /// is omitted.
    pub fn selected_group(&self, group_id: Option<&str>) -> Option<&EnvironmentGroup> {
        match group_id {
            Some(id) => self.environment_groups.iter().find(|g| g.id == id),
            None => self.default_group(),
        }
    }

    /// Mutable variant of [`Project::selected_group`].
    pub fn selected_group_mut(&mut self, group_id: Option<&str>) -> Option<&mut EnvironmentGroup> {
        match group_id {
            Some(id) => self.environment_groups.iter_mut().find(|g| g.id == id),
            None => self.environment_groups.first_mut(),
        }
    }

    /// Finds a test suite by id or, failing that, by name.
    pub fn suite(&self, reference: &str) -> Option<&TestSuite> {
        self.suites
            .iter()
            .find(|s| s.id == reference)
            .or_else(|| self.suites.iter().find(|s| s.name == reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::HttpMethod;
    use serde_json::json;

    fn sample_project() -> Project {
        let mut grandchild = Folder::new("deep");
        grandchild.id = "f-deep".to_string();

        let mut child = Folder::new("api");
        child.id = "f-api".to_string();
        child.folders.push(grandchild);
        child
            .requests
            .push(HttpRequest::new("login", HttpMethod::POST, "/login"));

        let mut root = Folder::new("root");
        root.id = "f-root".to_string();
        root.folders.push(child);

        let mut project = Project::new(root);
        project.environment_groups.push(EnvironmentGroup::new(
            "default",
            vec![Environment::new("dev"), Environment::new("prod")],
        ));
        project
    }

    #[test]
    fn test_folder_chain_and_parent() {
        let project = sample_project();

        let chain = project.folder_chain("f-deep").unwrap();
        let names: Vec<&str> = chain.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["root", "api", "deep"]);

        assert_eq!(project.parent_of("f-deep").unwrap().id, "f-api");
        assert_eq!(project.parent_of("f-api").unwrap().id, "f-root");
        assert!(project.parent_of("f-root").is_none());
        assert!(project.folder_chain("nope").is_none());
    }

    #[test]
    fn test_folder_mut_lookup() {
        let mut project = sample_project();
        project
            .folder_mut("f-api")
            .unwrap()
            .variables
            .local_default
            .set("key", "value");

        assert_eq!(
            project
                .folder("f-api")
                .unwrap()
                .variables
                .local_default
                .get("key"),
            Some(&json!("value"))
        );
    }

    #[test]
    fn test_environment_group_activation() {
        let mut group = EnvironmentGroup::new(
            "g",
            vec![Environment::new("dev"), Environment::new("prod")],
        );
        assert_eq!(group.active_environment().unwrap().name, "dev");

        assert!(group.set_active("prod"));
        assert_eq!(group.active_environment().unwrap().name, "prod");

        assert!(!group.set_active("staging"));
        assert_eq!(group.active_environment().unwrap().name, "prod");

        assert!(!group.set_active_index(5));
        assert!(group.set_active_index(0));
        assert_eq!(group.active_environment().unwrap().name, "dev");
    }

    #[test]
    fn test_folder_env_stores_created_on_demand() {
        let mut variables = FolderVariables::new();
        assert!(variables.local_env_store("g", "dev").is_none());

        variables.local_env_store_mut("g", "dev").set("url", "x");
        assert_eq!(
            variables.local_env_store("g", "dev").unwrap().get("url"),
            Some(&json!("x"))
        );
        assert!(variables.shared_env_store("g", "dev").is_none());
    }

    #[test]
    fn test_clear_local_and_shared() {
        let mut variables = FolderVariables::new();
        variables.local_default.set("a", 1);
        variables.local_env_store_mut("g", "dev").set("b", 2);
        variables.shared_default.set("c", 3);
        variables.shared_env_store_mut("g", "dev").set("d", 4);

        variables.clear_local();
        assert!(variables.local_default.is_empty());
        assert!(variables.local_env_store("g", "dev").is_none());
        assert!(variables.shared_default.has("c"));

        variables.clear_shared();
        assert!(variables.shared_default.is_empty());
        assert!(variables.shared_env_store("g", "dev").is_none());
    }

    #[test]
    fn test_selected_group_defaults_to_first() {
        let project = sample_project();
        assert_eq!(project.selected_group(None).unwrap().id, "default");
        assert_eq!(project.selected_group(Some("default")).unwrap().id, "default");
        assert!(project.selected_group(Some("missing")).is_none());
    }

    #[test]
    fn test_suite_lookup_by_id_then_name() {
        let mut project = sample_project();
        let mut suite = TestSuite {
            id: "s-1".to_string(),
            name: "smoke".to_string(),
            steps: vec![SuiteStep::Folder("/api".to_string())],
        };
        project.suites.push(suite.clone());
        suite.id = "s-2".to_string();
        suite.name = "s-1".to_string();
        project.suites.push(suite);

        // id match wins over a name that collides with another suite's id
        assert_eq!(project.suite("s-1").unwrap().name, "smoke");
        assert_eq!(project.suite("smoke").unwrap().id, "s-1");
        assert!(project.suite("missing").is_none());
    }

    #[test]
    fn test_project_from_json() {
        let json = r#"{
            "root": {
                "id": "r",
                "name": "root",
                "folders": [
                    {
                        "id": "a",
                        "name": "accounts",
                        "requests": [
                            {"name": "list", "method": "GET", "url": "{{baseUrl}}/accounts"}
                        ]
                    }
                ]
            },
            "environment_groups": [
                {
                    "id": "default",
                    "environments": [
                        {"name": "dev", "variables": {"kind": "environment", "values": {"baseUrl": "http://localhost"}}}
                    ]
                }
            ]
        }"#;

        let project = Project::from_json(json).unwrap();
        assert_eq!(project.root.folders[0].requests[0].name, "list");
        let group = project.default_group().unwrap();
        assert_eq!(
            group.active_environment().unwrap().variables.get("baseUrl"),
            Some(&json!("http://localhost"))
        );
    }
}
