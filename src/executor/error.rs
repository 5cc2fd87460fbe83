//! Run-level error types.
//!
//! Transport-level failures ([`TransportError`]) describe what went wrong on
//! the wire; [`RunError`] wraps them together with the failures only the
//! orchestrator can produce: unresolvable references and script failures.

use crate::executor::script::ScriptPhase;
use crate::executor::transport::TransportError;
use std::fmt;

/// Errors that can occur while orchestrating a run.
#[derive(Debug)]
pub enum RunError {
    /// A path, suite reference, or folder reference resolved to nothing.
    NotFound(String),

    /// A pre-request or test script failed to evaluate.
    ///
    /// Distinct from a test that ran and failed: a recorded test failure is
    /// data in the report, a script failure is an error.
    ScriptFailure {
        phase: ScriptPhase,
        message: String,
    },

    /// The transport could not produce a response.
    Transport(TransportError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::NotFound(reference) => write!(f, "Not found: {}", reference),
            RunError::ScriptFailure { phase, message } => {
                write!(f, "{} script failed: {}", phase, message)
            }
            RunError::Transport(err) => write!(f, "Transport error: {}", err),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for RunError {
    fn from(err: TransportError) -> Self {
        RunError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let not_found = RunError::NotFound("/api/missing".to_string());
        assert_eq!(format!("{}", not_found), "Not found: /api/missing");

        let script = RunError::ScriptFailure {
            phase: ScriptPhase::PreRequest,
            message: "boom".to_string(),
        };
        assert_eq!(format!("{}", script), "pre-request script failed: boom");

        let transport = RunError::from(TransportError::Timeout);
        assert_eq!(format!("{}", transport), "Transport error: Request timed out");
    }

    #[test]
    fn test_transport_source() {
        let err = RunError::from(TransportError::Timeout);
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&RunError::NotFound("x".into())).is_none());
    }
}
