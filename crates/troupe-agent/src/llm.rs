//! Model-backed leaf agent.
//!
//! A leaf turns (instruction template, context map, session history, user
//! input) into events: it renders the instruction, calls the model, routes
//! tool-call requests through its tool set, and loops until the model
//! returns final content or the round bound trips. Tool-level failures
//! are fed back to the model as error results so it can retry its own
//! call; they never fail the run.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use troupe_core::content::{Content, Part, Role, ToolCallPart, ToolOutcome, ToolResultPart};
use troupe_core::error::TemplateError;
use troupe_core::event::Event;
use troupe_core::model::{LanguageModel, ModelRequest, ToolDeclaration};
use troupe_core::state::{StateMap, render_instruction};
use troupe_core::tool::{Tool, ToolSet};

use crate::agent::Agent;
use crate::context::ExecutionContext;
use crate::error::AgentError;

/// Safety bound against runaway delegation, not a normal path.
pub(crate) const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

/// Name of the synthetic tool through which a model delegates to a
/// sub-agent.
pub const TRANSFER_TOOL_NAME: &str = "transfer_to_agent";

/// Configuration for a model-backed leaf agent.
pub struct LlmAgentConfig {
    /// Agent name, unique among its siblings
    pub name: String,

    /// Description parents use to decide delegation
    pub description: String,

    /// The model that backs this agent
    pub model: Arc<dyn LanguageModel>,

    /// Instruction template; `{key}` placeholders are substituted from
    /// the context map at execution time
    pub instruction: String,

    /// Tools available to the model
    pub tools: Vec<Arc<dyn Tool>>,

    /// Agents (local or remote) the model may delegate to
    pub sub_agents: Vec<Arc<Agent>>,

    /// Context-map slot the final output is written into
    pub output_key: Option<String>,

    /// Optional JSON schema the final output must conform to
    pub output_schema: Option<Value>,

    /// Maximum model round-trips per execution; 0 means the default
    pub max_tool_rounds: usize,
}

impl LlmAgentConfig {
    /// Start a config with the two required fields
    pub fn new(name: impl Into<String>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            model,
            instruction: String::new(),
            tools: Vec::new(),
            sub_agents: Vec::new(),
            output_key: None,
            output_schema: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the instruction template
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Add a tool
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add a delegation target
    pub fn with_sub_agent(mut self, agent: Arc<Agent>) -> Self {
        self.sub_agents.push(agent);
        self
    }

    /// Write the final output into this context-map slot
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    /// Require the final output to conform to this JSON schema
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Override the tool-round safety bound
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }
}

pub(crate) struct LlmAgent {
    pub(crate) model: Arc<dyn LanguageModel>,
    pub(crate) instruction: String,
    pub(crate) tools: ToolSet,
    pub(crate) sub_agents: Vec<Arc<Agent>>,
    pub(crate) output_key: Option<troupe_core::state::StateKey>,
    pub(crate) output_schema: Option<Value>,
    pub(crate) max_tool_rounds: usize,
}

#[derive(serde::Deserialize)]
struct TransferArgs {
    agent_name: String,
}

impl LlmAgent {
    pub(crate) async fn execute(
        &self,
        agent: &Agent,
        mut ctx: ExecutionContext,
    ) -> Result<ExecutionContext, AgentError> {
        if ctx.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let instruction = render_instruction(&self.instruction, &ctx.state).map_err(|e| match e {
            TemplateError::MissingContextKey { key } => AgentError::MissingContextKey {
                agent: agent.name().to_string(),
                key,
            },
            other => AgentError::InvalidInstruction {
                agent: agent.name().to_string(),
                reason: other.to_string(),
            },
        })?;

        let mut declarations = self.tools.declarations();
        if !self.sub_agents.is_empty() {
            declarations.push(self.transfer_declaration());
        }

        let tool_ctx = ctx.tool_context(agent.name());
        let mut conversation = ctx.history.clone();

        for round in 0..self.max_tool_rounds {
            let request = ModelRequest {
                instruction: instruction.clone(),
                history: conversation.clone(),
                tools: declarations.clone(),
                output_schema: self.output_schema.clone(),
            };

            debug!(
                agent = %agent.name(),
                model = %self.model.model_id(),
                round,
                "Calling model"
            );

            let response = tokio::select! {
                _ = ctx.cancellation.cancelled() => return Err(AgentError::Cancelled),
                result = self.model.generate(request) => result.map_err(|e| AgentError::Model {
                    agent: agent.name().to_string(),
                    source: e,
                })?,
            };

            let calls: Vec<ToolCallPart> = response.content.tool_calls().cloned().collect();

            if calls.is_empty() {
                let text = response.content.text();
                let mut delta = StateMap::new();
                if let Some(key) = &self.output_key {
                    ctx.put_state(key.clone(), text.clone());
                    delta.insert(key.clone(), text);
                }
                let event =
                    Event::new(agent.name(), response.content.clone()).with_state_delta(delta);
                ctx.emit(event).await?;
                ctx.history.push(response.content);
                return Ok(ctx);
            }

            // Record the model's tool-call request before executing it.
            ctx.emit(Event::new(agent.name(), response.content.clone()))
                .await?;
            conversation.push(response.content.clone());
            ctx.history.push(response.content);

            let mut results = Content::empty(Role::User);
            let mut transfer: Option<(Arc<Agent>, ToolCallPart)> = None;

            for call in calls {
                if call.tool_name == TRANSFER_TOOL_NAME && !self.sub_agents.is_empty() {
                    match self.resolve_transfer(&call) {
                        Ok(target) => {
                            transfer = Some((target, call));
                            break;
                        }
                        Err(message) => {
                            results.parts.push(Part::ToolResult(ToolResultPart {
                                call_id: call.call_id,
                                tool_name: call.tool_name,
                                outcome: ToolOutcome::Error { message },
                            }));
                            continue;
                        }
                    }
                }

                let outcome = tokio::select! {
                    _ = ctx.cancellation.cancelled() => return Err(AgentError::Cancelled),
                    result = self.tools.invoke(&tool_ctx, &call.tool_name, call.arguments.clone()) => {
                        match result {
                            Ok(output) => ToolOutcome::Success { output },
                            Err(e) => {
                                warn!(
                                    agent = %agent.name(),
                                    tool = %call.tool_name,
                                    error = %e,
                                    "Tool invocation failed"
                                );
                                ToolOutcome::Error {
                                    message: e.to_string(),
                                }
                            }
                        }
                    }
                };

                results.parts.push(Part::ToolResult(ToolResultPart {
                    call_id: call.call_id,
                    tool_name: call.tool_name,
                    outcome,
                }));
            }

            if let Some((target, call)) = transfer {
                // Delegation preempts the rest of this round: acknowledge
                // the transfer, then the sub-agent takes over the turn.
                let ack = Content::empty(Role::User).with_part(Part::ToolResult(ToolResultPart {
                    call_id: call.call_id,
                    tool_name: call.tool_name,
                    outcome: ToolOutcome::Success {
                        output: json!({ "transferred_to": target.name() }),
                    },
                }));
                ctx.emit(Event::new(agent.name(), ack.clone())).await?;
                ctx.history.push(ack);

                info!(
                    agent = %agent.name(),
                    target = %target.name(),
                    remote = target.is_remote(),
                    "Delegating to sub-agent"
                );

                let child_name = target.name().to_string();
                return target.execute(ctx).await.map_err(|e| {
                    if e.is_cancelled() {
                        AgentError::Cancelled
                    } else {
                        AgentError::ChildFailed {
                            composite: agent.name().to_string(),
                            child: child_name,
                            source: Box::new(e),
                        }
                    }
                });
            }

            ctx.emit(Event::new(agent.name(), results.clone())).await?;
            conversation.push(results.clone());
            ctx.history.push(results);
        }

        Err(AgentError::ToolLoopExceeded {
            agent: agent.name().to_string(),
            limit: self.max_tool_rounds,
        })
    }

    /// Find the delegation target named by a transfer call. The error
    /// string goes back to the model as a tool result so it can correct
    /// itself.
    fn resolve_transfer(&self, call: &ToolCallPart) -> Result<Arc<Agent>, String> {
        let args: TransferArgs = serde_json::from_value(call.arguments.clone())
            .map_err(|e| format!("Invalid transfer arguments: {}", e))?;
        self.sub_agents
            .iter()
            .find(|a| a.name() == args.agent_name)
            .cloned()
            .ok_or_else(|| format!("Unknown agent '{}'", args.agent_name))
    }

    fn transfer_declaration(&self) -> ToolDeclaration {
        let roster = self
            .sub_agents
            .iter()
            .map(|a| format!("- {}: {}", a.name(), a.description()))
            .collect::<Vec<_>>()
            .join("\n");

        ToolDeclaration {
            name: TRANSFER_TOOL_NAME.to_string(),
            description: format!(
                "Delegate the current request to a sub-agent. Available agents:\n{}",
                roster
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "agent_name": {
                        "type": "string",
                        "description": "Name of the agent to delegate to."
                    }
                },
                "required": ["agent_name"]
            }),
        }
    }
}
