//! Request and folder execution orchestration.
//!
//! The [`Orchestrator`] owns the project and two pluggable collaborators: an
//! [`HttpTransport`] that puts requests on the wire and a [`ScriptRunner`]
//! that evaluates pre-request and test scripts. Every top-level entry point
//! (`send_request`, `run_request`, `run_folder`, `run_test_suite`) opens its
//! own run session: a fresh runtime variable store and a fresh
//! [`RunReport`], both discarded when the call returns. Entry points take
//! `&mut self`, so a script cannot recursively start a second run on the
//! same orchestrator.
//!
//! Requests always execute on detached clones. Builder mutations made by
//! pre-request scripts and placeholder substitution never write back into
//! the project tree; only the variable stores are durably mutated.

pub mod error;
pub mod script;
pub mod transport;

pub use error::RunError;
pub use script::{
    FolderAccess, GlobalAccess, NoScripts, ScriptError, ScriptPhase, ScriptRunner, ScriptScope,
    TestRecord, VariableAccess,
};
pub use transport::{HttpTransport, ReqwestTransport, TransportError};

use crate::models::request::HttpRequest;
use crate::models::response::HttpResponse;
use crate::project::{path, Folder, Project, SuiteStep};
use crate::variables::scope::ScopeChain;
use crate::variables::store::{StoreKind, VariableStore};
use crate::variables::substitution::apply_to_request;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// A runnable request reference: a path into the project tree, or an inline
/// request built by the caller.
#[derive(Debug, Clone)]
pub enum RequestRef {
    /// A path resolved against the project root (`/api/users/GET:list`).
    Path(String),
    /// A detached request. Variable resolution anchors at the root folder.
    Inline(HttpRequest),
}

impl From<&str> for RequestRef {
    fn from(path: &str) -> Self {
        RequestRef::Path(path.to_string())
    }
}

impl From<String> for RequestRef {
    fn from(path: String) -> Self {
        RequestRef::Path(path)
    }
}

impl From<HttpRequest> for RequestRef {
    fn from(request: HttpRequest) -> Self {
        RequestRef::Inline(request)
    }
}

/// The outcome of one executed request within a run.
#[derive(Debug)]
pub struct StepResult {
    /// Name of the executed request.
    pub request_name: String,
    /// The response, when dispatch completed.
    pub response: Option<HttpResponse>,
    /// Test records registered by the request's test script.
    pub tests: Vec<TestRecord>,
    /// The failure that stopped this step, when dispatch or a script failed.
    pub error: Option<String>,
}

impl StepResult {
    /// A step passes when it completed and none of its tests failed.
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.tests.iter().all(|t| t.passed)
    }
}

/// The aggregated outcome of one run session.
#[derive(Debug)]
pub struct RunReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    steps: Vec<StepResult>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    /// Executed steps in execution order.
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// Number of passed steps.
    pub fn passed(&self) -> usize {
        self.steps.iter().filter(|s| s.passed()).count()
    }

    /// Number of failed steps.
    pub fn failed(&self) -> usize {
        self.steps.len() - self.passed()
    }

    /// Whether every step passed.
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.passed())
    }
}

/// Owns the project and drives runs through the transport and script runner.
pub struct Orchestrator<T, S> {
    project: Project,
    transport: T,
    scripts: S,
    env_group: Option<String>,
}

impl<T: HttpTransport, S: ScriptRunner> Orchestrator<T, S> {
    /// Creates an orchestrator over a project. The default environment group
    /// (the project's first) is selected.
    pub fn new(project: Project, transport: T, scripts: S) -> Self {
        Self {
            project,
            transport,
            scripts,
            env_group: None,
        }
    }

    /// The project as currently mutated by script variable writes.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Mutable project access, for host-side edits between runs (activating
    /// environments, editing stores).
    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// Selects the environment group used for resolution. `None` restores
    /// the default (first) group.
    pub fn set_environment_group(&mut self, group_id: Option<String>) {
        self.env_group = group_id;
    }

    /// Looks up a request by path and returns a detached clone, or `None`
    /// when the path resolves to nothing.
    pub fn find_request(&self, request_path: &str) -> Option<HttpRequest> {
        path::resolve_request(&self.project, None, request_path).map(|(_, r)| r.clone())
    }

    /// Looks up a folder by path and returns a detached clone.
    pub fn find_folder(&self, folder_path: &str) -> Option<Folder> {
        path::resolve_folder(&self.project, None, folder_path).cloned()
    }

    /// Sends a request without evaluating its scripts and returns the raw
    /// response.
    pub async fn send_request(
        &mut self,
        reference: impl Into<RequestRef>,
    ) -> Result<HttpResponse, RunError> {
        let (request, folder_id) = self.resolve(reference.into())?;
        let mut runtime = VariableStore::new(StoreKind::Runtime);
        let (response, _) = self
            .execute_one(request, folder_id, &mut runtime, false)
            .await?;
        Ok(response)
    }

    /// Runs a single request with its pre-request and test scripts and
    /// returns the report.
    ///
    /// Script failures and transport failures are errors here; there is no
    /// partial report to aggregate into.
    pub async fn run_request(
        &mut self,
        reference: impl Into<RequestRef>,
    ) -> Result<RunReport, RunError> {
        let (request, folder_id) = self.resolve(reference.into())?;
        let mut report = RunReport::new();
        let mut runtime = VariableStore::new(StoreKind::Runtime);

        let name = request.name.clone();
        let (response, tests) = self
            .execute_one(request, folder_id, &mut runtime, true)
            .await?;
        report.steps.push(StepResult {
            request_name: name,
            response: Some(response),
            tests,
            error: None,
        });
        Ok(report)
    }

    /// Runs every request under a folder, depth-first, in declared order:
    /// the folder's own requests first, then each child folder.
    ///
    /// All requests share one run session, so runtime variables set by one
    /// request are visible to the next. A failing request is recorded in the
    /// report and the run continues.
    pub async fn run_folder(&mut self, folder_path: &str) -> Result<RunReport, RunError> {
        let folder_id = path::resolve_folder(&self.project, None, folder_path)
            .map(|f| f.id.clone())
            .ok_or_else(|| RunError::NotFound(folder_path.to_string()))?;

        let mut report = RunReport::new();
        let mut runtime = VariableStore::new(StoreKind::Runtime);
        self.execute_folder(folder_id, &mut runtime, &mut report)
            .await;
        Ok(report)
    }

    /// Runs a test suite, located by id or name. All steps share one run
    /// session; an unresolvable step is recorded as a failure and the suite
    /// continues.
    pub async fn run_test_suite(&mut self, reference: &str) -> Result<RunReport, RunError> {
        let suite = self
            .project
            .suite(reference)
            .cloned()
            .ok_or_else(|| RunError::NotFound(reference.to_string()))?;

        let mut report = RunReport::new();
        let mut runtime = VariableStore::new(StoreKind::Runtime);

        for step in suite.steps {
            match step {
                SuiteStep::Folder(folder_path) => {
                    let folder_id = path::resolve_folder(&self.project, None, &folder_path)
                        .map(|f| f.id.clone());
                    match folder_id {
                        Some(folder_id) => {
                            self.execute_folder(folder_id, &mut runtime, &mut report)
                                .await;
                        }
                        None => {
                            log::warn!("suite step folder not found: {}", folder_path);
                            report.steps.push(StepResult {
                                request_name: folder_path.clone(),
                                response: None,
                                tests: Vec::new(),
                                error: Some(format!("folder not found: {}", folder_path)),
                            });
                        }
                    }
                }
                SuiteStep::Request(request_path) => {
                    let resolved = path::resolve_request(&self.project, None, &request_path)
                        .map(|(folder, request)| (folder.id.clone(), request.clone()));
                    match resolved {
                        Some((folder_id, request)) => {
                            self.execute_step(request, Some(folder_id), &mut runtime, &mut report)
                                .await;
                        }
                        None => {
                            log::warn!("suite step request not found: {}", request_path);
                            report.steps.push(StepResult {
                                request_name: request_path.clone(),
                                response: None,
                                tests: Vec::new(),
                                error: Some(format!("request not found: {}", request_path)),
                            });
                        }
                    }
                }
            }
        }
        Ok(report)
    }

    /// Resolves a reference to a detached request clone and the folder id
    /// that anchors its variable resolution.
    fn resolve(&self, reference: RequestRef) -> Result<(HttpRequest, Option<String>), RunError> {
        match reference {
            RequestRef::Path(p) => path::resolve_request(&self.project, None, &p)
                .map(|(folder, request)| (request.clone(), Some(folder.id.clone())))
                .ok_or(RunError::NotFound(p)),
            RequestRef::Inline(request) => {
                Ok((request, Some(self.project.root.id.clone())))
            }
        }
    }

    /// Executes one request within a shared session and records the outcome
    /// in the report, continuing on failure.
    async fn execute_step(
        &mut self,
        request: HttpRequest,
        folder_id: Option<String>,
        runtime: &mut VariableStore,
        report: &mut RunReport,
    ) {
        let name = request.name.clone();
        match self.execute_one(request, folder_id, runtime, true).await {
            Ok((response, tests)) => report.steps.push(StepResult {
                request_name: name,
                response: Some(response),
                tests,
                error: None,
            }),
            Err(err) => {
                log::warn!("request '{}' failed: {}", name, err);
                report.steps.push(StepResult {
                    request_name: name,
                    response: None,
                    tests: Vec::new(),
                    error: Some(err.to_string()),
                });
            }
        }
    }

    /// Depth-first folder execution over a shared session. Boxed because it
    /// recurses through child folders.
    fn execute_folder<'a>(
        &'a mut self,
        folder_id: String,
        runtime: &'a mut VariableStore,
        report: &'a mut RunReport,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            // detach the plan so script variable writes during execution
            // cannot invalidate the traversal
            let Some(folder) = self.project.folder(&folder_id) else {
                return;
            };
            let requests: Vec<HttpRequest> = folder.requests.clone();
            let children: Vec<String> = folder.folders.iter().map(|f| f.id.clone()).collect();

            for request in requests {
                self.execute_step(request, Some(folder_id.clone()), &mut *runtime, &mut *report)
                    .await;
            }
            for child in children {
                self.execute_folder(child, &mut *runtime, &mut *report)
                    .await;
            }
        })
    }

    /// The per-request pipeline: pre-request script, substitution, dispatch,
    /// test script.
    ///
    /// The pre-request script runs before substitution so runtime variables
    /// it sets are visible to placeholders in the same request.
    async fn execute_one(
        &mut self,
        mut request: HttpRequest,
        folder_id: Option<String>,
        runtime: &mut VariableStore,
        with_scripts: bool,
    ) -> Result<(HttpResponse, Vec<TestRecord>), RunError> {
        let group = self.env_group.clone();

        if with_scripts {
            if let Some(source) = request.pre_request_script.clone() {
                let mut scope = ScriptScope::new(
                    ScriptPhase::PreRequest,
                    &mut request,
                    None,
                    &mut self.project,
                    &mut *runtime,
                    folder_id.clone(),
                    group.clone(),
                );
                self.scripts
                    .evaluate(&source, &mut scope)
                    .await
                    .map_err(|e| RunError::ScriptFailure {
                        phase: ScriptPhase::PreRequest,
                        message: e.message,
                    })?;
            }
        }

        {
            let chain = ScopeChain::new(
                &self.project,
                &*runtime,
                folder_id.as_deref(),
                group.as_deref(),
            );
            apply_to_request(&mut request, &chain);
        }

        log::debug!("dispatching {} {}", request.method, request.url);
        let response = self.transport.issue(&request).await?;

        let mut tests = Vec::new();
        if with_scripts {
            if let Some(source) = request.test_script.clone() {
                let mut scope = ScriptScope::new(
                    ScriptPhase::Test,
                    &mut request,
                    Some(&response),
                    &mut self.project,
                    &mut *runtime,
                    folder_id,
                    group,
                );
                self.scripts
                    .evaluate(&source, &mut scope)
                    .await
                    .map_err(|e| RunError::ScriptFailure {
                        phase: ScriptPhase::Test,
                        message: e.message,
                    })?;
                tests = scope.into_tests();
            }
        }

        Ok((response, tests))
    }
}
