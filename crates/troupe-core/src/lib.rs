//! # Troupe Core
//!
//! Core contracts for the Troupe agent runtime: content payloads, session
//! events, the shared context map, the tool-invocation contract, the
//! model-provider boundary, and the session/memory persistence boundaries
//! with their in-memory implementations.

pub mod content;
pub mod error;
pub mod event;
pub mod in_memory;
pub mod memory;
pub mod model;
pub mod session;
pub mod state;
pub mod tool;

pub use content::{Content, Part, Role, TextPart, ToolCallPart, ToolOutcome, ToolResultPart};
pub use error::{
    ConfigError, MemoryError, ModelError, SessionError, TemplateError, ToolError,
};
pub use event::Event;
pub use in_memory::{InMemoryMemoryService, InMemorySessionStore};
pub use memory::{MemoryFragment, MemoryService, SearchResponse};
pub use model::{FinishReason, LanguageModel, ModelRequest, ModelResponse, ToolDeclaration};
pub use session::{Session, SessionKey, SessionStore};
pub use state::{InvalidStateKey, StateKey, StateMap, render_instruction};
pub use tool::{FunctionTool, MemorySearchTool, Tool, ToolContext, ToolSet};
