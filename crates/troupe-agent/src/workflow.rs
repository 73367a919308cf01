//! Workflow composites: sequential pipelines and parallel waves.

use std::sync::Arc;

use tracing::debug;

use crate::agent::Agent;
use crate::context::ExecutionContext;
use crate::error::AgentError;

/// Configuration shared by the workflow composites.
pub struct WorkflowConfig {
    /// Composite name
    pub name: String,

    /// Description parents use to decide delegation
    pub description: String,

    /// Child agents, in the order that matters to the composite
    pub children: Vec<Arc<Agent>>,
}

impl WorkflowConfig {
    /// Start a config with the composite's name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            children: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a child
    pub fn with_child(mut self, child: Arc<Agent>) -> Self {
        self.children.push(child);
        self
    }

    /// Add several children, preserving order
    pub fn with_children(mut self, children: impl IntoIterator<Item = Arc<Agent>>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Runs children strictly in listed order. Context writes made by child
/// *i* are visible to child *i+1*; a child failure is fatal to the whole
/// composite and is labeled with the failing child's name.
pub(crate) struct SequentialAgent {
    pub(crate) children: Vec<Arc<Agent>>,
}

impl SequentialAgent {
    pub(crate) async fn execute(
        &self,
        agent: &Agent,
        mut ctx: ExecutionContext,
    ) -> Result<ExecutionContext, AgentError> {
        for child in &self.children {
            if ctx.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            debug!(
                composite = %agent.name(),
                child = %child.name(),
                "Running pipeline stage"
            );

            ctx = Arc::clone(child).execute(ctx).await.map_err(|e| {
                if e.is_cancelled() {
                    AgentError::Cancelled
                } else {
                    AgentError::ChildFailed {
                        composite: agent.name().to_string(),
                        child: child.name().to_string(),
                        source: Box::new(e),
                    }
                }
            })?;
        }
        Ok(ctx)
    }
}

/// Runs all children concurrently against the same snapshot of the
/// incoming context. No child observes another's output during the
/// wave; deltas merge into the shared context only after every child
/// has finished, in child-list order. There is no fail-fast: every
/// child gets the chance to finish, and the composite's error names
/// every failing child.
///
/// The interleaving of events across children in the outward stream is
/// nondeterministic by design; only the post-join state merge is
/// ordered.
pub(crate) struct ParallelAgent {
    pub(crate) children: Vec<Arc<Agent>>,
}

impl ParallelAgent {
    pub(crate) async fn execute(
        &self,
        agent: &Agent,
        mut ctx: ExecutionContext,
    ) -> Result<ExecutionContext, AgentError> {
        if ctx.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        debug!(
            composite = %agent.name(),
            children = self.children.len(),
            "Starting parallel wave"
        );

        let base_len = ctx.history.len();
        let mut handles = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let child_ctx = ctx.child_snapshot();
            handles.push((
                child.name().to_string(),
                tokio::spawn(Arc::clone(child).execute(child_ctx)),
            ));
        }

        let mut failures: Vec<(String, AgentError)> = Vec::new();
        let mut cancelled = false;

        for (name, handle) in handles {
            match handle.await {
                Ok(Ok(child_ctx)) => {
                    ctx.state.merge(&child_ctx.state_delta);
                    ctx.state_delta.merge(&child_ctx.state_delta);
                    ctx.history
                        .extend(child_ctx.history.into_iter().skip(base_len));
                }
                Ok(Err(e)) if e.is_cancelled() => cancelled = true,
                Ok(Err(e)) => failures.push((name, e)),
                Err(join_err) => {
                    let message = join_err.to_string();
                    failures.push((name.clone(), AgentError::Internal {
                        agent: name,
                        message,
                    }));
                }
            }
        }

        if cancelled || ctx.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        if !failures.is_empty() {
            return Err(AgentError::ParallelFailed {
                composite: agent.name().to_string(),
                failures,
            });
        }
        Ok(ctx)
    }
}
