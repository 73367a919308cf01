//! Content payloads exchanged between users, agents, models, and tools.

use serde::{Deserialize, Serialize};

/// Role of a content producer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Content from a user (or from a client agent acting on behalf of one)
    User,

    /// Content produced by an agent
    Agent,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Agent => write!(f, "agent"),
        }
    }
}

/// One unit of conversational content: a role plus an ordered list of parts.
///
/// `Content` is the payload carried by every [`crate::event::Event`] and by
/// every model exchange. Parts keep text and tool traffic in one ordered
/// sequence so that a single model turn can mix free text with tool-call
/// requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Who produced this content
    pub role: Role,

    /// Ordered content parts
    pub parts: Vec<Part>,
}

impl Content {
    /// Create user content with a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Create agent content with a single text part
    pub fn agent_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            parts: vec![Part::text(text)],
        }
    }

    /// Create empty content for the given role
    pub fn empty(role: Role) -> Self {
        Self {
            role,
            parts: Vec::new(),
        }
    }

    /// Add a part
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Join all text parts into one string
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Iterate over the tool-call request parts
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallPart> {
        self.parts.iter().filter_map(|p| match p {
            Part::ToolCall(call) => Some(call),
            _ => None,
        })
    }

    /// Whether any part is a tool-call request
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls().next().is_some()
    }
}

/// A content part within a [`Content`] payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Part {
    /// Plain text
    #[serde(rename = "text")]
    Text(TextPart),

    /// A model's request to invoke a tool
    #[serde(rename = "toolCall")]
    ToolCall(ToolCallPart),

    /// The outcome of a tool invocation, fed back to the model
    #[serde(rename = "toolResult")]
    ToolResult(ToolResultPart),
}

impl Part {
    /// Create a text part
    pub fn text(content: impl Into<String>) -> Self {
        Part::Text(TextPart {
            text: content.into(),
        })
    }

    /// Create a tool-call request part with a fresh call id
    pub fn tool_call(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Part::ToolCall(ToolCallPart::new(tool_name, arguments))
    }

    /// Get the text content if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(t) => Some(&t.text),
            _ => None,
        }
    }
}

/// Plain text part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPart {
    /// The text content
    pub text: String,
}

/// A model's structured request to invoke a named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPart {
    /// Correlates this request with its result part
    pub call_id: String,

    /// Name of the tool to invoke
    pub tool_name: String,

    /// Raw arguments as produced by the model
    pub arguments: serde_json::Value,
}

impl ToolCallPart {
    /// Create a tool-call part with a generated call id
    pub fn new(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            call_id: uuid::Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// The recorded outcome of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultPart {
    /// The call id of the request this result answers
    pub call_id: String,

    /// Name of the invoked tool
    pub tool_name: String,

    /// Success or failure of the invocation
    pub outcome: ToolOutcome,
}

/// Result of a tool invocation as surfaced to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ToolOutcome {
    /// The handler produced a typed result
    Success {
        /// The tool's output value
        output: serde_json::Value,
    },

    /// The invocation failed; the message is surfaced to the model so it
    /// can retry its own call
    Error {
        /// Human-readable failure description
        message: String,
    },
}
