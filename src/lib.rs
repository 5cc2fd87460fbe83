//! Scoped variable resolution and request execution orchestration for
//! project trees of HTTP requests.
//!
//! A [`project::Project`] is a tree of folders and requests with variable
//! stores attached at every level: per-run runtime values, per-folder
//! defaults (local and shared), per-folder environment values, and global
//! stores, all resolved through a single precedence chain
//! ([`variables::scope::ScopeChain`]). Request text may reference variables
//! as `{{name}}` placeholders, substituted in one fail-soft pass right
//! before dispatch.
//!
//! The [`executor::Orchestrator`] drives runs: it resolves path references
//! (`/api/users/GET:list`), evaluates pre-request and test scripts through a
//! pluggable [`executor::ScriptRunner`], substitutes placeholders, and
//! dispatches through a pluggable [`executor::HttpTransport`]
//! ([`executor::ReqwestTransport`] in production).
//!
//! # Examples
//!
//! ```no_run
//! use request_runner::executor::{NoScripts, Orchestrator, ReqwestTransport};
//! use request_runner::project::Project;
//!
//! # async fn run(project: Project) -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::new()?;
//! let mut orchestrator = Orchestrator::new(project, transport, NoScripts);
//!
//! let report = orchestrator.run_folder("/api/smoke").await?;
//! println!("{} passed, {} failed", report.passed(), report.failed());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod executor;
pub mod models;
pub mod project;
pub mod variables;

pub use executor::{
    HttpTransport, NoScripts, Orchestrator, ReqwestTransport, RequestRef, RunError, RunReport,
    ScriptRunner, StepResult, TestRecord, TransportError,
};
pub use models::request::{HttpMethod, HttpRequest};
pub use models::response::HttpResponse;
pub use project::Project;
pub use variables::{ScopeChain, StoreKind, VariableStore};
