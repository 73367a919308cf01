//! The agent tree.
//!
//! Agents form a closed set of variants (model-backed leaf, sequential
//! composite, parallel composite, remote proxy) so composite traversal
//! stays exhaustive and checkable. A tree is immutable after
//! construction; all run state lives in the per-run execution context.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;

use troupe_core::error::ConfigError;
use troupe_core::state::StateKey;
use troupe_core::tool::ToolSet;

use crate::context::ExecutionContext;
use crate::error::AgentError;
use crate::llm::{DEFAULT_MAX_TOOL_ROUNDS, LlmAgent, LlmAgentConfig};
use crate::remote::{RemoteAgent, RemoteAgentConfig};
use crate::workflow::{ParallelAgent, SequentialAgent, WorkflowConfig};

/// A named unit that can produce content in response to a request,
/// optionally using tools and sub-agents.
pub struct Agent {
    name: String,
    description: String,
    kind: AgentKind,
}

/// The closed set of agent variants.
pub(crate) enum AgentKind {
    Llm(LlmAgent),
    Sequential(SequentialAgent),
    Parallel(ParallelAgent),
    Remote(RemoteAgent),
}

impl Agent {
    /// Build a model-backed leaf agent.
    pub fn llm(config: LlmAgentConfig) -> Result<Self, ConfigError> {
        validate_agent_name(&config.name)?;

        let mut tools = ToolSet::new();
        for tool in config.tools {
            tools.register(tool)?;
        }

        let mut seen = HashSet::new();
        for sub_agent in &config.sub_agents {
            if !seen.insert(sub_agent.name().to_string()) {
                return Err(ConfigError::DuplicateSubAgent {
                    agent: sub_agent.name().to_string(),
                });
            }
        }

        let output_key = match config.output_key {
            Some(key) => Some(StateKey::new(&key)?),
            None => None,
        };

        let max_tool_rounds = if config.max_tool_rounds == 0 {
            DEFAULT_MAX_TOOL_ROUNDS
        } else {
            config.max_tool_rounds
        };

        Ok(Self {
            name: config.name,
            description: config.description,
            kind: AgentKind::Llm(LlmAgent {
                model: config.model,
                instruction: config.instruction,
                tools,
                sub_agents: config.sub_agents,
                output_key,
                output_schema: config.output_schema,
                max_tool_rounds,
            }),
        })
    }

    /// Build a composite that runs its children strictly in listed order.
    pub fn sequential(config: WorkflowConfig) -> Result<Self, ConfigError> {
        let (name, description, children) = validate_workflow(config)?;
        Ok(Self {
            name,
            description,
            kind: AgentKind::Sequential(SequentialAgent { children }),
        })
    }

    /// Build a composite that runs all children concurrently against the
    /// same snapshot of the incoming context.
    pub fn parallel(config: WorkflowConfig) -> Result<Self, ConfigError> {
        let (name, description, children) = validate_workflow(config)?;
        Ok(Self {
            name,
            description,
            kind: AgentKind::Parallel(ParallelAgent { children }),
        })
    }

    /// Connect to a network-hosted agent: fetch its capability card and
    /// wrap it so a parent cannot distinguish it from a local sub-agent.
    pub async fn remote_a2a(config: RemoteAgentConfig) -> Result<Self, AgentError> {
        let (name, description, remote) = RemoteAgent::connect(config).await?;
        validate_agent_name(&name).map_err(AgentError::Config)?;
        Ok(Self {
            name,
            description,
            kind: AgentKind::Remote(remote),
        })
    }

    /// The agent's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description parents use to decide delegation
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether this node forwards execution to another process
    pub fn is_remote(&self) -> bool {
        matches!(self.kind, AgentKind::Remote(_))
    }

    /// Whether this node has children or delegation targets
    pub fn has_sub_agents(&self) -> bool {
        !self.sub_agents().is_empty()
    }

    /// Children of a composite, or the delegation targets of a leaf
    pub fn sub_agents(&self) -> &[Arc<Agent>] {
        match &self.kind {
            AgentKind::Llm(llm) => &llm.sub_agents,
            AgentKind::Sequential(seq) => &seq.children,
            AgentKind::Parallel(par) => &par.children,
            AgentKind::Remote(_) => &[],
        }
    }

    /// The cached capability card of a remote proxy
    pub fn capability_card(&self) -> Option<&troupe_a2a::CapabilityCard> {
        match &self.kind {
            AgentKind::Remote(remote) => Some(remote.card()),
            _ => None,
        }
    }

    /// Variant name for logging
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            AgentKind::Llm(_) => "llm",
            AgentKind::Sequential(_) => "sequential",
            AgentKind::Parallel(_) => "parallel",
            AgentKind::Remote(_) => "remote",
        }
    }

    /// Execute this node. Boxed so composites can recurse and parallel
    /// waves can spawn children as independent tasks.
    pub(crate) fn execute(
        self: Arc<Self>,
        ctx: ExecutionContext,
    ) -> BoxFuture<'static, Result<ExecutionContext, AgentError>> {
        Box::pin(async move {
            match &self.kind {
                AgentKind::Llm(llm) => llm.execute(&self, ctx).await,
                AgentKind::Sequential(seq) => seq.execute(&self, ctx).await,
                AgentKind::Parallel(par) => par.execute(&self, ctx).await,
                AgentKind::Remote(remote) => remote.execute(&self, ctx).await,
            }
        })
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("kind", &self.kind_name())
            .field("sub_agents", &self.sub_agents().len())
            .finish()
    }
}

fn validate_workflow(
    config: WorkflowConfig,
) -> Result<(String, String, Vec<Arc<Agent>>), ConfigError> {
    validate_agent_name(&config.name)?;
    if config.children.is_empty() {
        return Err(ConfigError::EmptyComposite { agent: config.name });
    }
    let mut seen = HashSet::new();
    for child in &config.children {
        if !seen.insert(child.name().to_string()) {
            return Err(ConfigError::DuplicateSubAgent {
                agent: child.name().to_string(),
            });
        }
    }
    Ok((config.name, config.description, config.children))
}

/// Agent names appear in events, error chains, and transfer arguments;
/// keep them to a charset that survives all three.
pub(crate) fn validate_agent_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidAgentName {
            name: name.to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }
    if name.len() > 128 {
        return Err(ConfigError::InvalidAgentName {
            name: name.to_string(),
            reason: format!("name too long: {} characters (max 128)", name.len()),
        });
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ConfigError::InvalidAgentName {
            name: name.to_string(),
            reason: "only alphanumeric characters, underscores, hyphens, and dots are allowed"
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use troupe_testing::MockModel;

    fn leaf(name: &str) -> Arc<Agent> {
        Arc::new(
            Agent::llm(LlmAgentConfig::new(name, Arc::new(MockModel::with_text("ok")))).unwrap(),
        )
    }

    #[test]
    fn empty_composites_are_rejected_at_construction() {
        let err = Agent::sequential(WorkflowConfig::new("pipeline")).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyComposite { agent } if agent == "pipeline"));
    }

    #[test]
    fn duplicate_children_are_rejected_at_construction() {
        let err = Agent::parallel(
            WorkflowConfig::new("scouts")
                .with_child(leaf("scout"))
                .with_child(leaf("scout")),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSubAgent { agent } if agent == "scout"));
    }

    #[test]
    fn invalid_names_are_rejected_at_construction() {
        for name in ["", "   ", "has space", "semi;colon"] {
            let err =
                Agent::llm(LlmAgentConfig::new(name, Arc::new(MockModel::with_text("ok"))))
                    .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidAgentName { .. }), "{name:?}");
        }
    }

    #[test]
    fn invalid_output_keys_are_rejected_at_construction() {
        let err = Agent::llm(
            LlmAgentConfig::new("scout", Arc::new(MockModel::with_text("ok")))
                .with_output_key("bad key"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOutputKey(_)));
    }

    #[test]
    fn capability_set_reflects_the_variant() {
        let seq = Agent::sequential(WorkflowConfig::new("pipeline").with_child(leaf("a"))).unwrap();
        assert!(!seq.is_remote());
        assert!(seq.has_sub_agents());
        assert_eq!(seq.kind_name(), "sequential");

        let leaf = leaf("b");
        assert!(!leaf.is_remote());
        assert!(!leaf.has_sub_agents());
        assert_eq!(leaf.kind_name(), "llm");
    }
}
