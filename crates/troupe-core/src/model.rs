//! The language-model provider boundary.
//!
//! The runtime treats inference as opaque and externally owned: a request
//! carries the rendered instruction, the conversation so far, the tool
//! declarations available to the calling agent, and an optional output
//! schema; the response carries content parts and a finish reason.
//! Everything else (transport, retries, auth) belongs to the provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::{Content, ToolCallPart};
use crate::error::ModelError;

/// A tool surfaced to the model: the semantic contract it needs to decide
/// whether and how to call the tool. The runtime never interprets the
/// description; the model does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDeclaration {
    /// Tool name, unique within the calling agent's tool set
    pub name: String,

    /// What the tool does, written for the model
    pub description: String,

    /// JSON schema of the tool's arguments
    pub parameters: serde_json::Value,
}

/// One inference request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    /// The rendered instruction for this turn
    pub instruction: String,

    /// Conversation history, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Content>,

    /// Tools the calling agent makes available
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,

    /// Optional JSON schema the final output must conform to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
}

/// Why the model stopped producing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinishReason {
    /// Natural end of the response
    Stop,

    /// The response requests tool invocations
    ToolCalls,

    /// The provider truncated the response
    Length,

    /// Any other provider-specific reason
    Other,
}

/// One inference response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    /// The produced content
    pub content: Content,

    /// Why production stopped
    pub finish_reason: FinishReason,
}

impl ModelResponse {
    /// A plain text response
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Content::agent_text(text),
            finish_reason: FinishReason::Stop,
        }
    }

    /// A response consisting of tool-call requests
    pub fn tool_calls(calls: Vec<ToolCallPart>) -> Self {
        let mut content = Content::empty(crate::content::Role::Agent);
        for call in calls {
            content.parts.push(crate::content::Part::ToolCall(call));
        }
        Self {
            content,
            finish_reason: FinishReason::ToolCalls,
        }
    }
}

/// The inference boundary.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier of the underlying model, for logging and diagnostics
    fn model_id(&self) -> &str;

    /// Run one inference call
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}
