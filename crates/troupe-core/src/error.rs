//! Error types for the core contracts.
//!
//! Each failure class from the runtime taxonomy gets its own enum so that
//! callers can route recovery precisely: configuration problems abort
//! construction, tool problems are surfaced back to the model, and
//! session/memory problems carry the identity they failed on.

use thiserror::Error;

use crate::session::SessionKey;
use crate::state::InvalidStateKey;

/// Malformed agent or tool wiring, detected at construction.
///
/// These are fatal: the system refuses to start rather than fail mid-run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Agent name failed validation
    #[error("Invalid agent name '{name}': {reason}")]
    InvalidAgentName { name: String, reason: String },

    /// Application name failed validation
    #[error("Invalid app name '{name}': {reason}")]
    InvalidAppName { name: String, reason: String },

    /// Two tools with the same name on one agent
    #[error("Duplicate tool name '{tool}'")]
    DuplicateTool { tool: String },

    /// Two children with the same name on one composite
    #[error("Duplicate sub-agent name '{agent}'")]
    DuplicateSubAgent { agent: String },

    /// A composite agent with no children cannot run
    #[error("Composite agent '{agent}' requires at least one child")]
    EmptyComposite { agent: String },

    /// Output key failed state-key validation
    #[error("Invalid output key: {0}")]
    InvalidOutputKey(#[from] InvalidStateKey),
}

/// Errors produced by the tool invoker and by tool handlers.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The requested name is not registered on the calling agent's tool set
    #[error("Unknown tool: {name}")]
    Unknown { name: String },

    /// Raw arguments could not be decoded into the tool's typed shape
    #[error("Failed to decode arguments for tool '{tool}': {reason}")]
    ArgumentDecode { tool: String, reason: String },

    /// The handler itself failed; surfaced to the model as a tool result
    #[error("Tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },
}

impl ToolError {
    /// Create an unknown-tool error
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::Unknown { name: name.into() }
    }

    /// Create an argument-decode error
    pub fn argument_decode(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArgumentDecode {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create an execution error wrapping a handler failure
    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Errors from the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session exists for the key; sessions are created explicitly
    #[error("Session not found: {key}")]
    NotFound { key: SessionKey },

    /// `create` was called for a key that already has a session
    #[error("Session already exists: {key}")]
    AlreadyExists { key: SessionKey },

    /// Backend failure unrelated to the key's existence
    #[error("Session store failed: {reason}")]
    StoreFailed { reason: String },
}

/// Errors from the memory service.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Ingesting a completed session failed
    #[error("Memory ingestion failed: {reason}")]
    IngestFailed { reason: String },

    /// A search could not be executed; distinct from an empty result set
    #[error("Memory search failed: {reason}")]
    SearchFailed { reason: String },
}

/// Errors from the external model provider boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider reported a failure
    #[error("Model provider error: {message}")]
    Provider { message: String },

    /// The provider's response did not match the expected shape
    #[error("Malformed model response: {reason}")]
    MalformedResponse { reason: String },
}

impl ModelError {
    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }
}

/// Errors from instruction placeholder rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The instruction references a key no earlier stage populated
    #[error("Instruction references context key '{key}' that has not been populated")]
    MissingContextKey { key: String },

    /// A `{` placeholder was never closed
    #[error("Unclosed placeholder starting at byte {position}")]
    UnclosedPlaceholder { position: usize },

    /// A placeholder with no key between the braces
    #[error("Empty placeholder at byte {position}")]
    EmptyPlaceholder { position: usize },
}
