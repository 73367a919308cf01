//! Agent and run error types.

use thiserror::Error;

use troupe_a2a::A2aError;
use troupe_core::error::{ConfigError, ModelError, SessionError};
use troupe_core::session::SessionKey;

/// Errors raised while executing an agent tree.
///
/// Composite failures carry the failing child's name so that a deep
/// pipeline failure can be traced to the node that caused it.
/// `Cancelled` is a distinct terminal outcome, not a failure: composites
/// propagate it unwrapped instead of labeling it as a child error.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model call itself failed
    #[error("Model call failed in agent '{agent}': {source}")]
    Model { agent: String, source: ModelError },

    /// The leaf hit its tool-round safety bound
    #[error("Agent '{agent}' exceeded the tool-call limit of {limit} rounds")]
    ToolLoopExceeded { agent: String, limit: usize },

    /// The instruction references a key no earlier stage populated;
    /// this means the pipeline ordering is wrong
    #[error("Agent '{agent}' references context key '{key}' that no earlier stage populated")]
    MissingContextKey { agent: String, key: String },

    /// The instruction template could not be parsed
    #[error("Instruction template of agent '{agent}' is malformed: {reason}")]
    InvalidInstruction { agent: String, reason: String },

    /// A sequential child (or a delegation target) failed
    #[error("Child '{child}' of '{composite}' failed: {source}")]
    ChildFailed {
        composite: String,
        child: String,
        source: Box<AgentError>,
    },

    /// One or more parallel children failed; every failing child is named
    #[error("Parallel composite '{composite}' failed: {}", format_failures(.failures))]
    ParallelFailed {
        composite: String,
        failures: Vec<(String, AgentError)>,
    },

    /// Remote delegation failed; never retried automatically here
    #[error("Remote agent '{agent}' failed: {source}")]
    Remote { agent: String, source: A2aError },

    /// A spawned child task panicked or was aborted
    #[error("Agent '{agent}' task failed: {message}")]
    Internal { agent: String, message: String },

    /// Construction-time wiring problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run was cancelled; a terminal outcome, not a failure
    #[error("Execution cancelled")]
    Cancelled,
}

impl AgentError {
    /// Whether this outcome is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }
}

fn format_failures(failures: &[(String, AgentError)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{}: {}", name, err))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Terminal outcomes of a run, surfaced on the event stream.
#[derive(Debug, Error)]
pub enum RunError {
    /// The session was never created; sessions are created explicitly
    #[error("Session not found: {key}")]
    SessionNotFound { key: SessionKey },

    /// The agent tree failed
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// The session store failed mid-run
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The run was cancelled: explicitly, by timeout, or because the
    /// consumer stopped reading the event stream
    #[error("Run cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_failure_names_the_failing_child() {
        let err = AgentError::ChildFailed {
            composite: "TripPlannerPipeline".to_string(),
            child: "RestaurantScout".to_string(),
            source: Box::new(AgentError::Remote {
                agent: "RestaurantScout".to_string(),
                source: A2aError::unavailable("connection refused"),
            }),
        };

        let rendered = err.to_string();
        assert!(rendered.contains("RestaurantScout"));
        assert!(rendered.contains("unavailable"));
    }

    #[test]
    fn parallel_failure_names_every_failing_child() {
        let err = AgentError::ParallelFailed {
            composite: "CityScouts".to_string(),
            failures: vec![
                (
                    "RestaurantScout".to_string(),
                    AgentError::Internal {
                        agent: "RestaurantScout".to_string(),
                        message: "panicked".to_string(),
                    },
                ),
                (
                    "ActivityScout".to_string(),
                    AgentError::ToolLoopExceeded {
                        agent: "ActivityScout".to_string(),
                        limit: 8,
                    },
                ),
            ],
        };

        let rendered = err.to_string();
        assert!(rendered.contains("RestaurantScout"));
        assert!(rendered.contains("ActivityScout"));
    }

    #[test]
    fn cancelled_is_not_a_failure_label() {
        assert!(AgentError::Cancelled.is_cancelled());
        assert!(
            !AgentError::Internal {
                agent: "x".to_string(),
                message: "y".to_string()
            }
            .is_cancelled()
        );
    }
}
