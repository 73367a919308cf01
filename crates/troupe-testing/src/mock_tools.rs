//! Mock tools that return predictable responses, with call tracking for
//! assertions about what an agent actually invoked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use troupe_core::error::ToolError;
use troupe_core::tool::{Tool, ToolContext};

/// A tool that returns predefined responses keyed by argument value.
#[derive(Clone)]
pub struct MockTool {
    name: String,
    description: String,
    responses: HashMap<String, Result<Value, String>>,
    default_response: Option<Result<Value, String>>,
    call_history: Arc<Mutex<Vec<Value>>>,
}

impl MockTool {
    /// Create a mock tool with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "Mock tool for testing".to_string(),
            responses: HashMap::new(),
            default_response: None,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the description surfaced to the model
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Respond with `output` when called with exactly `arguments`
    pub fn with_response(mut self, arguments: Value, output: Value) -> Self {
        self.responses.insert(arguments.to_string(), Ok(output));
        self
    }

    /// Fail when called with exactly `arguments`
    pub fn with_failure(mut self, arguments: Value, error: impl Into<String>) -> Self {
        self.responses
            .insert(arguments.to_string(), Err(error.into()));
        self
    }

    /// Respond with `output` for any unmatched arguments
    pub fn with_default_response(mut self, output: Value) -> Self {
        self.default_response = Some(Ok(output));
        self
    }

    /// Fail for any unmatched arguments
    pub fn with_default_failure(mut self, error: impl Into<String>) -> Self {
        self.default_response = Some(Err(error.into()));
        self
    }

    /// Number of times the tool has been called
    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    /// Arguments of every call, oldest first
    pub fn call_history(&self) -> Vec<Value> {
        self.call_history.lock().unwrap().clone()
    }

    /// Whether the tool was called with exactly these arguments
    pub fn was_called_with(&self, arguments: &Value) -> bool {
        self.call_history.lock().unwrap().contains(arguments)
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn call(&self, _ctx: &ToolContext, arguments: Value) -> Result<Value, ToolError> {
        self.call_history.lock().unwrap().push(arguments.clone());

        let response = self
            .responses
            .get(&arguments.to_string())
            .or(self.default_response.as_ref());

        match response {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(ToolError::execution(&self.name, message.clone())),
            None => Ok(json!({ "mock": format!("response for {}", arguments) })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use troupe_core::session::SessionKey;
    use troupe_core::state::StateMap;

    fn ctx() -> ToolContext {
        ToolContext::new(
            "tester",
            "inv-1",
            SessionKey::new("app", "user", "s1"),
            StateMap::new(),
        )
    }

    #[tokio::test]
    async fn responses_match_by_arguments() {
        let tool = MockTool::new("weather")
            .with_response(json!({"city": "Tokyo"}), json!("sunny"))
            .with_default_response(json!("unknown"));

        let exact = tool.call(&ctx(), json!({"city": "Tokyo"})).await.unwrap();
        assert_eq!(exact, json!("sunny"));

        let fallback = tool.call(&ctx(), json!({"city": "Mars"})).await.unwrap();
        assert_eq!(fallback, json!("unknown"));

        assert_eq!(tool.call_count(), 2);
        assert!(tool.was_called_with(&json!({"city": "Tokyo"})));
    }

    #[tokio::test]
    async fn failures_surface_as_execution_errors() {
        let tool = MockTool::new("flaky").with_default_failure("backend down");
        let err = tool.call(&ctx(), json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
