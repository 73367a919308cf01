//! Tools: typed, callable capabilities an agent can invoke while
//! producing its output, plus the per-agent registry that dispatches a
//! model's tool-call requests into handlers.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ConfigError, MemoryError, ToolError};
use crate::memory::{MemoryService, SearchResponse};
use crate::model::ToolDeclaration;
use crate::session::SessionKey;
use crate::state::StateMap;

/// Invocation context handed to every tool call.
///
/// Carries the identity of the calling agent and run, a snapshot of the
/// shared context map as the agent saw it, the run's cancellation token,
/// and an optional handle to the memory service.
#[derive(Clone)]
pub struct ToolContext {
    /// Name of the calling agent
    pub agent_name: String,

    /// Identifier of the enclosing run
    pub invocation_id: String,

    /// The session the run belongs to
    pub session: SessionKey,

    /// Snapshot of the context map at the calling agent's start
    pub state: StateMap,

    cancellation: CancellationToken,
    memory: Option<Arc<dyn MemoryService>>,
}

impl ToolContext {
    /// Create a context for the given agent and run
    pub fn new(
        agent_name: impl Into<String>,
        invocation_id: impl Into<String>,
        session: SessionKey,
        state: StateMap,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            invocation_id: invocation_id.into(),
            session,
            state,
            cancellation: CancellationToken::new(),
            memory: None,
        }
    }

    /// Attach the run's cancellation token
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Attach a memory service handle
    pub fn with_memory(mut self, memory: Arc<dyn MemoryService>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// The run's cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the run has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Search previously ingested sessions of this run's (app, user).
    ///
    /// Fails with [`MemoryError::SearchFailed`] when the run has no
    /// memory service attached.
    pub async fn search_memory(&self, query: &str) -> Result<SearchResponse, MemoryError> {
        let memory = self.memory.as_ref().ok_or_else(|| MemoryError::SearchFailed {
            reason: "no memory service attached to this run".to_string(),
        })?;
        memory
            .search(&self.session.app_name, &self.session.user_id, query)
            .await
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("agent_name", &self.agent_name)
            .field("invocation_id", &self.invocation_id)
            .field("session", &self.session)
            .field("has_memory", &self.memory.is_some())
            .finish()
    }
}

/// A typed, callable capability.
///
/// The description is the semantic contract the model consumes; the
/// runtime never interprets it. Side effects are the handler's
/// responsibility; the invoker only dispatches.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, unique within an agent's tool set
    fn name(&self) -> &str;

    /// What the tool does, written for the model
    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments
    fn parameters(&self) -> Value {
        json!({ "type": "object" })
    }

    /// Execute the tool with the model-produced arguments
    async fn call(&self, ctx: &ToolContext, arguments: Value) -> Result<Value, ToolError>;

    /// The declaration surfaced to the model for this tool
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// A tool backed by a typed async function.
///
/// Arguments are decoded into `A` before the handler runs; a decode
/// failure becomes [`ToolError::ArgumentDecode`] without invoking the
/// handler. The handler's typed result is serialized back into the wire
/// value surfaced to the model.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use troupe_core::tool::FunctionTool;
/// use troupe_core::error::ToolError;
///
/// #[derive(Deserialize)]
/// struct Args {
///     num: u64,
/// }
///
/// let tool = FunctionTool::new(
///     "check_prime",
///     "Checks if a number is prime",
///     |_ctx, args: Args| async move {
///         let n = args.num;
///         let prime = n > 1 && !(2..n).take_while(|i| i * i <= n).any(|i| n % i == 0);
///         Ok::<_, ToolError>(prime)
///     },
/// );
/// ```
pub struct FunctionTool<A, R, F, Fut> {
    name: String,
    description: String,
    parameters: Value,
    handler: F,
    _marker: PhantomData<fn() -> (A, R, Fut)>,
}

impl<A, R, F, Fut> FunctionTool<A, R, F, Fut>
where
    A: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(ToolContext, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
{
    /// Create a function tool with the default object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({ "type": "object" }),
            handler,
            _marker: PhantomData,
        }
    }

    /// Set the argument schema surfaced to the model
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}

#[async_trait]
impl<A, R, F, Fut> Tool for FunctionTool<A, R, F, Fut>
where
    A: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(ToolContext, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        self.parameters.clone()
    }

    async fn call(&self, ctx: &ToolContext, arguments: Value) -> Result<Value, ToolError> {
        let args: A = serde_json::from_value(arguments)
            .map_err(|e| ToolError::argument_decode(&self.name, e.to_string()))?;
        let result = (self.handler)(ctx.clone(), args).await?;
        serde_json::to_value(result).map_err(|e| ToolError::execution(&self.name, e.to_string()))
    }
}

/// A per-agent tool registry and invoker.
///
/// Registration order is preserved so the declarations surfaced to the
/// model are stable across runs. Registering two tools under one name is
/// a configuration error, detected at construction.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolSet {
    /// Create an empty tool set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, consuming and returning the set for chaining
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, ConfigError> {
        self.register(tool)?;
        Ok(self)
    }

    /// Register a tool under its own name
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ConfigError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ConfigError::DuplicateTool { tool: name });
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Declarations for every registered tool, in registration order
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.order
            .iter()
            .map(|name| self.tools[name].declaration())
            .collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a registered tool exactly once.
    ///
    /// Fails with [`ToolError::Unknown`], without any side effect, if
    /// the name is not registered. The handler runs at most once per
    /// call; retries, if any, are the calling agent's policy.
    pub async fn invoke(
        &self,
        ctx: &ToolContext,
        name: &str,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::unknown(name))?;
        debug!(tool = %name, agent = %ctx.agent_name, "Dispatching tool call");
        tool.call(ctx, arguments).await
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet").field("tools", &self.order).finish()
    }
}

/// Built-in tool that searches previously ingested sessions.
///
/// Gives a model-backed agent recall over earlier conversations through
/// [`ToolContext::search_memory`].
#[derive(Debug, Default)]
pub struct MemorySearchTool;

impl MemorySearchTool {
    /// Tool name as surfaced to the model
    pub const NAME: &'static str = "search_memory";

    /// Create the tool
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for MemorySearchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Searches past conversations for fragments matching the query. \
         Use keywords in the language the user is speaking."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The query to search for in memory."
                }
            },
            "required": ["query"]
        })
    }

    async fn call(&self, ctx: &ToolContext, arguments: Value) -> Result<Value, ToolError> {
        #[derive(serde::Deserialize)]
        struct Args {
            query: String,
        }

        let args: Args = serde_json::from_value(arguments)
            .map_err(|e| ToolError::argument_decode(Self::NAME, e.to_string()))?;
        let response = ctx
            .search_memory(&args.query)
            .await
            .map_err(|e| ToolError::execution(Self::NAME, e.to_string()))?;
        Ok(json!({ "results": response.texts() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> ToolContext {
        ToolContext::new(
            "tester",
            "inv-1",
            SessionKey::new("app", "user", "s1"),
            StateMap::new(),
        )
    }

    fn counting_tool(calls: Arc<AtomicUsize>) -> Arc<dyn Tool> {
        #[derive(serde::Deserialize)]
        struct Args {
            text: String,
        }

        Arc::new(FunctionTool::new(
            "echo",
            "Echoes the input",
            move |_ctx, args: Args| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ToolError>(args.text)
                }
            },
        ))
    }

    #[tokio::test]
    async fn invoke_dispatches_to_registered_tool() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tools = ToolSet::new().with_tool(counting_tool(calls.clone())).unwrap();

        let result = tools
            .invoke(&ctx(), "echo", json!({ "text": "hello" }))
            .await
            .unwrap();

        assert_eq!(result, json!("hello"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_tool_fails_without_side_effect() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tools = ToolSet::new().with_tool(counting_tool(calls.clone())).unwrap();

        let err = tools
            .invoke(&ctx(), "nonexistent", json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::Unknown { name } if name == "nonexistent"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_arguments_fail_before_the_handler_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tools = ToolSet::new().with_tool(counting_tool(calls.clone())).unwrap();

        let err = tools
            .invoke(&ctx(), "echo", json!({ "text": 42 }))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::ArgumentDecode { tool, .. } if tool == "echo"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_failure_becomes_execution_error() {
        #[derive(serde::Deserialize)]
        struct Args {}

        let tools = ToolSet::new()
            .with_tool(Arc::new(FunctionTool::new(
                "flaky",
                "Always fails",
                |_ctx, _args: Args| async move {
                    Err::<String, _>(ToolError::execution("flaky", "backend down"))
                },
            )))
            .unwrap();

        let err = tools.invoke(&ctx(), "flaky", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[test]
    fn duplicate_registration_is_a_config_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = ToolSet::new()
            .with_tool(counting_tool(calls.clone()))
            .unwrap()
            .with_tool(counting_tool(calls));

        assert!(matches!(
            result.unwrap_err(),
            ConfigError::DuplicateTool { tool } if tool == "echo"
        ));
    }

    #[test]
    fn declarations_preserve_registration_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let tools = ToolSet::new()
            .with_tool(Arc::new(MemorySearchTool::new()))
            .unwrap()
            .with_tool(counting_tool(calls))
            .unwrap();

        let names: Vec<String> = tools.declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, ["search_memory", "echo"]);
    }

    #[tokio::test]
    async fn memory_search_without_service_fails_as_execution_error() {
        let tools = ToolSet::new()
            .with_tool(Arc::new(MemorySearchTool::new()))
            .unwrap();

        let err = tools
            .invoke(&ctx(), MemorySearchTool::NAME, json!({ "query": "이름" }))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn tool_sees_the_state_snapshot_it_was_handed() {
        let mut state = StateMap::new();
        state.insert(crate::state::StateKey::new("city").unwrap(), "Tokyo");
        let ctx = ToolContext::new(
            "tester",
            "inv-1",
            SessionKey::new("app", "user", "s1"),
            state,
        );

        let observed = Arc::new(Mutex::new(None));
        let observed_in_tool = Arc::clone(&observed);

        #[derive(serde::Deserialize)]
        struct Args {}

        let tools = ToolSet::new()
            .with_tool(Arc::new(FunctionTool::new(
                "probe",
                "Records the state snapshot",
                move |ctx: ToolContext, _args: Args| {
                    let observed = Arc::clone(&observed_in_tool);
                    async move {
                        *observed.lock().unwrap() = ctx.state.get("city").map(str::to_string);
                        Ok::<_, ToolError>("ok")
                    }
                },
            )))
            .unwrap();

        tools.invoke(&ctx, "probe", json!({})).await.unwrap();
        assert_eq!(observed.lock().unwrap().as_deref(), Some("Tokyo"));
    }
}
