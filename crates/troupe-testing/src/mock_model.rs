//! Mock language model with scripted responses.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use troupe_core::content::ToolCallPart;
use troupe_core::error::ModelError;
use troupe_core::model::{LanguageModel, ModelRequest, ModelResponse};

/// A model that replays scripted responses and records every request.
///
/// Scripted responses are consumed in order; once the script is
/// exhausted the model falls back to its default response, and without
/// one it fails with a provider error. The request log makes it easy to
/// assert what an agent actually sent: rendered instruction, history
/// length, declared tools.
pub struct MockModel {
    model_id: String,
    script: Mutex<VecDeque<ModelResponse>>,
    default_response: Option<ModelResponse>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl MockModel {
    /// A model with an empty script and no default; every call fails
    pub fn new() -> Self {
        Self {
            model_id: "mock-model".to_string(),
            script: Mutex::new(VecDeque::new()),
            default_response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model that always responds with the given text
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut model = Self::new();
        model.default_response = Some(ModelResponse::text(text));
        model
    }

    /// Queue a scripted text response
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then_response(ModelResponse::text(text))
    }

    /// Queue a scripted response with a single tool call
    pub fn then_tool_call(self, tool_name: impl Into<String>, arguments: Value) -> Self {
        self.then_response(ModelResponse::tool_calls(vec![ToolCallPart::new(
            tool_name, arguments,
        )]))
    }

    /// Queue an arbitrary scripted response
    pub fn then_response(self, response: ModelResponse) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    /// Every request the model has received, oldest first
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<ModelRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().unwrap().push(request);

        if let Some(response) = self.script.lock().unwrap().pop_front() {
            return Ok(response);
        }
        if let Some(default) = &self.default_response {
            return Ok(default.clone());
        }
        Err(ModelError::provider("mock model script exhausted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use troupe_core::model::FinishReason;

    fn request() -> ModelRequest {
        ModelRequest {
            instruction: "hi".to_string(),
            history: Vec::new(),
            tools: Vec::new(),
            output_schema: None,
        }
    }

    #[tokio::test]
    async fn script_is_consumed_in_order_then_falls_back() {
        let model = MockModel::with_text("fallback")
            .then_tool_call("lookup", json!({"q": "x"}))
            .then_text("second");

        let first = model.generate(request()).await.unwrap();
        assert_eq!(first.finish_reason, FinishReason::ToolCalls);

        let second = model.generate(request()).await.unwrap();
        assert_eq!(second.content.text(), "second");

        let third = model.generate(request()).await.unwrap();
        assert_eq!(third.content.text(), "fallback");

        assert_eq!(model.request_count(), 3);
    }

    #[tokio::test]
    async fn exhausted_script_without_default_fails() {
        let model = MockModel::new();
        let err = model.generate(request()).await.unwrap_err();
        assert!(matches!(err, ModelError::Provider { .. }));
    }
}
