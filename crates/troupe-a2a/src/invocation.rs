//! Wire types for remote invocation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use troupe_core::Content;

/// A request to execute a remote agent.
///
/// Each invocation is independent: no session continuity is assumed
/// across separate calls unless the caller supplies `session_id`
/// explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    /// The input content for the remote agent
    pub input: Content,

    /// Context-map entries the caller wants the remote run to see
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub state: HashMap<String, String>,

    /// Optional explicit session identity for multi-call continuity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl InvokeRequest {
    /// Create a request with no context and no session continuity
    pub fn new(input: Content) -> Self {
        Self {
            input,
            state: HashMap::new(),
            session_id: None,
        }
    }

    /// Attach context-map entries
    pub fn with_state(mut self, state: HashMap<String, String>) -> Self {
        self.state = state;
        self
    }

    /// Request session continuity under the given id
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// The remote agent's response: the resulting content, not the full
/// event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    /// The content produced by the remote run
    pub content: Content,
}

impl InvokeResponse {
    /// Wrap content in a response
    pub fn new(content: Content) -> Self {
        Self { content }
    }
}
