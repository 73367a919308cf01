//! Remote agent proxy.
//!
//! Wraps a network-hosted agent behind the same execution contract as a
//! local node: the capability card is fetched once at connect time, and
//! its description becomes the delegation contract a parent leaf sees.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use troupe_a2a::client::A2aClient;
use troupe_a2a::{CapabilityCard, InvokeRequest};
use troupe_core::content::{Content, Role};
use troupe_core::event::Event;

use crate::agent::Agent;
use crate::context::ExecutionContext;
use crate::error::AgentError;

/// Configuration for a remote (A2A) sub-agent.
pub struct RemoteAgentConfig {
    /// Local name override; defaults to the card's name
    pub name: Option<String>,

    /// Description override; defaults to the card's description, which
    /// is the remote side's delegation contract
    pub description: Option<String>,

    /// Where to fetch the capability card from
    pub card_url: String,
}

impl RemoteAgentConfig {
    /// Point at a remote agent's base URL
    pub fn new(card_url: impl Into<String>) -> Self {
        Self {
            name: None,
            description: None,
            card_url: card_url.into(),
        }
    }

    /// Override the local name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the description used for delegation decisions
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub(crate) struct RemoteAgent {
    pub(crate) client: A2aClient,
    pub(crate) card: Arc<CapabilityCard>,
}

impl RemoteAgent {
    /// Fetch and cache the capability card, resolving the proxy's local
    /// name and description.
    pub(crate) async fn connect(
        config: RemoteAgentConfig,
    ) -> Result<(String, String, RemoteAgent), AgentError> {
        let label = config
            .name
            .clone()
            .unwrap_or_else(|| config.card_url.clone());

        let mut client = A2aClient::new(&config.card_url).map_err(|e| AgentError::Remote {
            agent: label.clone(),
            source: e,
        })?;

        let card = client.discover().await.map_err(|e| AgentError::Remote {
            agent: label.clone(),
            source: e,
        })?;

        info!(
            agent = %card.name,
            url = %config.card_url,
            "Connected to remote agent"
        );

        let name = config.name.unwrap_or_else(|| card.name.clone());
        let description = config
            .description
            .unwrap_or_else(|| card.description.clone());

        Ok((name, description, RemoteAgent { client, card }))
    }

    /// The cached capability card
    pub(crate) fn card(&self) -> &CapabilityCard {
        &self.card
    }

    pub(crate) async fn execute(
        &self,
        agent: &Agent,
        mut ctx: ExecutionContext,
    ) -> Result<ExecutionContext, AgentError> {
        if ctx.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let state: HashMap<String, String> = ctx
            .state
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_string()))
            .collect();
        let request = InvokeRequest::new(ctx.user_content.clone()).with_state(state);

        debug!(
            agent = %agent.name(),
            url = %self.client.base_url(),
            "Invoking remote agent"
        );

        let response = tokio::select! {
            _ = ctx.cancellation.cancelled() => return Err(AgentError::Cancelled),
            result = self.client.invoke(request) => result.map_err(|e| AgentError::Remote {
                agent: agent.name().to_string(),
                source: e,
            })?,
        };

        let content = Content {
            role: Role::Agent,
            parts: response.content.parts,
        };
        ctx.emit(Event::new(agent.name(), content.clone())).await?;
        ctx.history.push(content);
        Ok(ctx)
    }
}
