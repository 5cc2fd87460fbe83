//! Script integration: the surface a script engine drives during a run.
//!
//! The engine itself is pluggable behind [`ScriptRunner`]; this module owns
//! the typed surface a script sees. A [`ScriptScope`] is built per script
//! invocation and borrows the live run state: the in-flight request clone,
//! the response (test phase only), the run's runtime store, and the project
//! tree for folder/global variable writes. Scopes are short-lived; nothing a
//! script can reach survives past the invocation except the variable writes
//! themselves.

use crate::models::request::HttpRequest;
use crate::models::response::HttpResponse;
use crate::project::Project;
use crate::variables::scope::ScopeChain;
use crate::variables::store::VariableStore;
use crate::variables::substitution::replace_in;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Which script of a request is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPhase {
    /// Runs before substitution and dispatch; may mutate the request.
    PreRequest,
    /// Runs after dispatch against the response; registers test results.
    Test,
}

impl ScriptPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptPhase::PreRequest => "pre-request",
            ScriptPhase::Test => "test",
        }
    }
}

impl fmt::Display for ScriptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A script failed to evaluate.
///
/// This is an engine-level failure (syntax error, thrown exception outside a
/// test block), not a failed test: failed tests are recorded as
/// [`TestRecord`]s and the script still completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ScriptError {}

/// The outcome of one named test block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    /// Test name as passed to the test registration call.
    pub name: String,
    /// Whether the test body completed without failing.
    pub passed: bool,
    /// Failure message, present exactly when `passed` is false.
    pub error: Option<String>,
}

/// Full-chain variable access: reads resolve through the complete scope
/// chain, writes land in the run's runtime store.
pub struct VariableAccess<'a> {
    project: &'a Project,
    runtime: &'a mut VariableStore,
    folder_id: Option<&'a str>,
    group_id: Option<&'a str>,
}

impl<'a> VariableAccess<'a> {
    fn chain(&self) -> ScopeChain<'_> {
        ScopeChain::new(self.project, self.runtime, self.folder_id, self.group_id)
    }

    /// Whether any store in the chain holds the name.
    pub fn has(&self, name: &str) -> bool {
        self.chain().has(name)
    }

    /// Resolves a variable through the full chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.chain().get(name).cloned()
    }

    /// Sets a runtime variable, shadowing every persistent store for the
    /// rest of the run.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.runtime.set(name, value);
    }

    /// Removes a runtime variable. Persistent stores are untouched, so the
    /// name may still resolve afterwards.
    pub fn unset(&mut self, name: &str) {
        self.runtime.unset(name);
    }

    /// Substitutes `{{name}}` tokens in arbitrary text through the chain.
    pub fn replace_in(&self, text: &str) -> String {
        replace_in(text, &self.chain())
    }
}

/// Global variable access: reads see only the global stores, writes target
/// the global default store or the active environment of the selected group.
pub struct GlobalAccess<'a> {
    project: &'a mut Project,
    group_id: Option<&'a str>,
}

impl<'a> GlobalAccess<'a> {
    fn chain(&self) -> ScopeChain<'_> {
        ScopeChain::global_scope(self.project, self.group_id)
    }

    fn active_env_store(&mut self) -> Option<&mut VariableStore> {
        self.project
            .selected_group_mut(self.group_id)
            .and_then(|group| group.active_environment_mut())
            .map(|env| &mut env.variables)
    }

    pub fn has(&self, name: &str) -> bool {
        self.chain().has(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.chain().get(name).cloned()
    }

    /// Substitutes `{{name}}` tokens using only the global stores.
    pub fn replace_in(&self, text: &str) -> String {
        replace_in(text, &self.chain())
    }

    /// Writes to the environment-independent global default store.
    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.project.globals.default.set(name, value);
    }

    pub fn remove_default(&mut self, name: &str) {
        self.project.globals.default.unset(name);
    }

    /// Writes to the active environment of the selected group. Returns false
    /// when the project has no matching group or the group is empty.
    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.active_env_store() {
            Some(store) => {
                store.set(name, value);
                true
            }
            None => false,
        }
    }

    pub fn remove_env(&mut self, name: &str) -> bool {
        match self.active_env_store() {
            Some(store) => {
                store.unset(name);
                true
            }
            None => false,
        }
    }

    pub fn clear_default(&mut self) {
        self.project.globals.default.clear();
    }

    pub fn clear_env(&mut self) -> bool {
        match self.active_env_store() {
            Some(store) => {
                store.clear();
                true
            }
            None => false,
        }
    }

    /// Clears every global store: the default store plus every environment
    /// store of every group, active or not.
    pub fn clear(&mut self) {
        self.clear_default();
        for group in &mut self.project.environment_groups {
            for env in &mut group.environments {
                env.variables.clear();
            }
        }
    }
}

/// Folder variable access, anchored at the folder enclosing the running
/// request: reads walk the folder chain only, writes target the anchor
/// folder's own stores.
pub struct FolderAccess<'a> {
    project: &'a mut Project,
    folder_id: &'a str,
    group_id: Option<&'a str>,
}

impl<'a> FolderAccess<'a> {
    fn chain(&self) -> ScopeChain<'_> {
        ScopeChain::folder_scope(self.project, Some(self.folder_id), self.group_id)
    }

    /// The selected group id and its active environment name, resolved
    /// fresh per write so environment switches are picked up.
    fn env_binding(&self) -> Option<(String, String)> {
        self.project.selected_group(self.group_id).and_then(|group| {
            group
                .active_environment()
                .map(|env| (group.id.clone(), env.name.clone()))
        })
    }

    pub fn has(&self, name: &str) -> bool {
        self.chain().has(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.chain().get(name).cloned()
    }

    /// Substitutes `{{name}}` tokens using only the folder walk.
    pub fn replace_in(&self, text: &str) -> String {
        replace_in(text, &self.chain())
    }

    pub fn set_local_default(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Some(folder) = self.project.folder_mut(self.folder_id) {
            folder.variables.local_default.set(name, value);
        }
    }

    pub fn set_shared_default(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        if let Some(folder) = self.project.folder_mut(self.folder_id) {
            folder.variables.shared_default.set(name, value);
        }
    }

    pub fn remove_local_default(&mut self, name: &str) {
        if let Some(folder) = self.project.folder_mut(self.folder_id) {
            folder.variables.local_default.unset(name);
        }
    }

    pub fn remove_shared_default(&mut self, name: &str) {
        if let Some(folder) = self.project.folder_mut(self.folder_id) {
            folder.variables.shared_default.unset(name);
        }
    }

    /// Writes to the folder's local store for the active environment.
    /// Returns false when no environment group is configured.
    pub fn set_local_env(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let Some((group, env)) = self.env_binding() else {
            return false;
        };
        match self.project.folder_mut(self.folder_id) {
            Some(folder) => {
                folder
                    .variables
                    .local_env_store_mut(&group, &env)
                    .set(name, value);
                true
            }
            None => false,
        }
    }

    /// Writes to the folder's shared store for the active environment.
    pub fn set_shared_env(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let Some((group, env)) = self.env_binding() else {
            return false;
        };
        match self.project.folder_mut(self.folder_id) {
            Some(folder) => {
                folder
                    .variables
                    .shared_env_store_mut(&group, &env)
                    .set(name, value);
                true
            }
            None => false,
        }
    }

    pub fn remove_local_env(&mut self, name: &str) -> bool {
        let Some((group, env)) = self.env_binding() else {
            return false;
        };
        match self.project.folder_mut(self.folder_id) {
            Some(folder) => {
                folder
                    .variables
                    .local_env_store_mut(&group, &env)
                    .unset(name);
                true
            }
            None => false,
        }
    }

    pub fn remove_shared_env(&mut self, name: &str) -> bool {
        let Some((group, env)) = self.env_binding() else {
            return false;
        };
        match self.project.folder_mut(self.folder_id) {
            Some(folder) => {
                folder
                    .variables
                    .shared_env_store_mut(&group, &env)
                    .unset(name);
                true
            }
            None => false,
        }
    }

    /// Clears every local store of the anchor folder, default and
    /// environment-specific.
    pub fn clear_local(&mut self) {
        if let Some(folder) = self.project.folder_mut(self.folder_id) {
            folder.variables.clear_local();
        }
    }

    /// Clears every shared store of the anchor folder.
    pub fn clear_shared(&mut self) {
        if let Some(folder) = self.project.folder_mut(self.folder_id) {
            folder.variables.clear_shared();
        }
    }
}

/// Everything a script can reach during one invocation.
pub struct ScriptScope<'a> {
    phase: ScriptPhase,
    /// The in-flight request clone. Pre-request scripts mutate it freely;
    /// the project tree never sees those mutations.
    pub request: &'a mut HttpRequest,
    response: Option<&'a HttpResponse>,
    project: &'a mut Project,
    runtime: &'a mut VariableStore,
    folder_id: Option<String>,
    group_id: Option<String>,
    tests: Vec<TestRecord>,
}

impl<'a> ScriptScope<'a> {
    /// Builds a scope for one script invocation.
    pub fn new(
        phase: ScriptPhase,
        request: &'a mut HttpRequest,
        response: Option<&'a HttpResponse>,
        project: &'a mut Project,
        runtime: &'a mut VariableStore,
        folder_id: Option<String>,
        group_id: Option<String>,
    ) -> Self {
        Self {
            phase,
            request,
            response,
            project,
            runtime,
            folder_id,
            group_id,
            tests: Vec::new(),
        }
    }

    pub fn phase(&self) -> ScriptPhase {
        self.phase
    }

    /// The response under test. `None` in the pre-request phase.
    pub fn response(&self) -> Option<&HttpResponse> {
        self.response
    }

    /// Full-chain variable access (runtime writes).
    pub fn variables(&mut self) -> VariableAccess<'_> {
        VariableAccess {
            project: self.project,
            runtime: self.runtime,
            folder_id: self.folder_id.as_deref(),
            group_id: self.group_id.as_deref(),
        }
    }

    /// Global variable access.
    pub fn globals(&mut self) -> GlobalAccess<'_> {
        GlobalAccess {
            project: self.project,
            group_id: self.group_id.as_deref(),
        }
    }

    /// Folder variable access, anchored at the running request's folder.
    /// `None` when the run has no folder context (inline requests resolve
    /// against the root folder, so they always have one).
    pub fn folder(&mut self) -> Option<FolderAccess<'_>> {
        self.folder_id.as_deref().map(|folder_id| FolderAccess {
            project: self.project,
            folder_id,
            group_id: self.group_id.as_deref(),
        })
    }

    /// Runs a named test block and records its outcome. A failing block
    /// produces a failed [`TestRecord`]; it never aborts the script.
    pub fn test(&mut self, name: impl Into<String>, body: impl FnOnce(&mut Self) -> Result<(), String>) {
        let name = name.into();
        let outcome = body(self);
        let record = match outcome {
            Ok(()) => TestRecord {
                name,
                passed: true,
                error: None,
            },
            Err(message) => TestRecord {
                name,
                passed: false,
                error: Some(message),
            },
        };
        self.tests.push(record);
    }

    /// The test records registered so far, in registration order.
    pub fn tests(&self) -> &[TestRecord] {
        &self.tests
    }

    /// Consumes the scope and yields its test records.
    pub fn into_tests(self) -> Vec<TestRecord> {
        self.tests
    }
}

/// Evaluates request scripts against a scope.
///
/// The production engine is host-provided; [`NoScripts`] is the null engine
/// for projects without scripting.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Evaluates one script. Errors abort the surrounding request run.
    async fn evaluate(
        &self,
        script: &str,
        scope: &mut ScriptScope<'_>,
    ) -> Result<(), ScriptError>;
}

/// A script runner that treats every script as empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScripts;

#[async_trait]
impl ScriptRunner for NoScripts {
    async fn evaluate(
        &self,
        _script: &str,
        _scope: &mut ScriptScope<'_>,
    ) -> Result<(), ScriptError> {
        Ok(())
    }
}
