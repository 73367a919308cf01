//! # Troupe
//!
//! Troupe is a runtime for composing model-backed agents into pipelines:
//! sequential and parallel workflows over a shared context map, typed
//! tool invocation, session event logs with searchable memory, and
//! agent-to-agent (A2A) delegation to network-hosted agents.
//!
//! ## Core pieces
//!
//! - **[`Agent`]**: the closed set of execution variants: model-backed
//!   leaf, sequential composite, parallel composite, remote proxy
//! - **[`Runner`]**: drives an agent tree over a session and streams
//!   [`Event`]s as they are produced
//! - **[`Tool`] / [`ToolSet`]**: typed capabilities routed from a
//!   model's function-call requests
//! - **[`SessionStore`] / [`MemoryService`]**: the persistence
//!   boundaries, with in-memory implementations
//! - **[`A2aClient`] / [`A2aServer`]**: capability discovery and remote
//!   invocation
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use troupe::{
//!     Agent, Content, InMemorySessionStore, LlmAgentConfig, Runner, RunnerConfig, SessionKey,
//! };
//!
//! let agent = Arc::new(Agent::llm(
//!     LlmAgentConfig::new("root_agent", model)
//!         .with_description("A helpful agent.")
//!         .with_instruction("You are a helpful assistant. Answer the user's questions."),
//! )?);
//!
//! let store = Arc::new(InMemorySessionStore::new());
//! store.create(SessionKey::new("HelloApp", "user1", "s1")).await?;
//!
//! let runner = Runner::new(RunnerConfig::new("HelloApp", agent, store))?;
//! let mut stream = runner.run("user1", "s1", Content::user_text("Hello!")).await?;
//! while let Some(event) = stream.next_event().await {
//!     print!("{}", event?.text());
//! }
//! ```

// ============================================================================
// Module aliases for namespaced access
// ============================================================================

pub use troupe_a2a as a2a;
pub use troupe_agent as agent;
pub use troupe_core as core;

// ============================================================================
// Core types: content, events, sessions, state
// ============================================================================

pub use troupe_core::{
    Content, Event, Part, Role, Session, SessionKey, StateKey, StateMap, TextPart, ToolCallPart,
    ToolOutcome, ToolResultPart,
};

// Persistence boundaries and in-memory implementations
pub use troupe_core::{
    InMemoryMemoryService, InMemorySessionStore, MemoryFragment, MemoryService, SearchResponse,
    SessionStore,
};

// Tool contract
pub use troupe_core::{FunctionTool, MemorySearchTool, Tool, ToolContext, ToolSet};

// Model boundary
pub use troupe_core::{FinishReason, LanguageModel, ModelRequest, ModelResponse, ToolDeclaration};

// Error taxonomy
pub use troupe_core::{
    ConfigError, MemoryError, ModelError, SessionError, TemplateError, ToolError,
};

// ============================================================================
// Agent tree and runner
// ============================================================================

pub use troupe_agent::{
    Agent, AgentError, LlmAgentConfig, RemoteAgentConfig, RunError, RunOptions, RunStream, Runner,
    RunnerBridge, RunnerConfig, TRANSFER_TOOL_NAME, USER_AUTHOR, WorkflowConfig,
};

// ============================================================================
// A2A delegation
// ============================================================================

pub use troupe_a2a::{
    A2aClient, A2aError, A2aServer, CapabilityCard, InvocationHandler, InvokeRequest,
    InvokeResponse,
};
