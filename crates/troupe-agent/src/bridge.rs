//! A2A server bridge: serves a local agent tree to remote callers.
//!
//! Each remote invocation runs the local root agent exactly as the
//! runner would for a local user turn, inside a private session scoped
//! to that invocation. Callers get session continuity only by supplying
//! a session id explicitly.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use troupe_a2a::{
    CapabilityCard, InvocationError, InvocationHandler, InvokeRequest, InvokeResponse,
};
use troupe_core::content::{Content, Role};
use troupe_core::error::SessionError;
use troupe_core::event::Event;
use troupe_core::session::SessionKey;
use troupe_core::state::{StateKey, StateMap};

use crate::runner::Runner;

/// User id recorded on sessions created for remote invocations.
pub const A2A_USER_ID: &str = "a2a";

/// Serves a [`Runner`]'s root agent over the A2A protocol.
pub struct RunnerBridge {
    runner: Arc<Runner>,
    public_url: String,
}

impl RunnerBridge {
    /// Bridge the runner's root agent, publishing `public_url` as the
    /// address on the capability card.
    pub fn new(runner: Arc<Runner>, public_url: impl Into<String>) -> Self {
        Self {
            runner,
            public_url: public_url.into(),
        }
    }
}

#[async_trait]
impl InvocationHandler for RunnerBridge {
    fn capability_card(&self) -> CapabilityCard {
        let agent = self.runner.agent();
        CapabilityCard::new(agent.name(), agent.description(), &self.public_url)
            .with_version(env!("CARGO_PKG_VERSION"))
    }

    async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResponse, InvocationError> {
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let key = SessionKey::new(self.runner.app_name(), A2A_USER_ID, &session_id);

        match self.runner.session_store().create(key.clone()).await {
            Ok(_) => {}
            // The caller asked for continuity with an existing session.
            Err(SessionError::AlreadyExists { .. }) => {}
            Err(e) => return Err(InvocationError::failed(e.to_string())),
        }

        if !request.state.is_empty() {
            let mut delta = StateMap::new();
            for (k, v) in &request.state {
                let state_key =
                    StateKey::new(k).map_err(|e| InvocationError::bad_request(e.to_string()))?;
                delta.insert(state_key, v.clone());
            }
            let context_event =
                Event::new(A2A_USER_ID, Content::empty(Role::User)).with_state_delta(delta);
            self.runner
                .session_store()
                .append(&key, context_event)
                .await
                .map_err(|e| InvocationError::failed(e.to_string()))?;
        }

        debug!(session = %key, "Running remote invocation");

        let mut stream = self
            .runner
            .run(A2A_USER_ID, &session_id, request.input)
            .await
            .map_err(|e| InvocationError::failed(e.to_string()))?;

        // The caller gets the resulting content, not the event stream.
        let mut last: Option<Content> = None;
        while let Some(item) = stream.next_event().await {
            match item {
                Ok(event) => {
                    if !event.content.text().is_empty() {
                        last = Some(event.content);
                    }
                }
                Err(e) => return Err(InvocationError::failed(e.to_string())),
            }
        }

        Ok(InvokeResponse::new(
            last.unwrap_or_else(|| Content::empty(Role::Agent)),
        ))
    }
}
