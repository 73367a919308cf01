//! Per-run execution context.
//!
//! The context is passed explicitly down the agent tree and merged back
//! up only at defined join points; it is never a process-wide singleton.
//! The control task owns the authoritative copy; parallel children work
//! on snapshots whose deltas merge after the wave joins.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use troupe_core::content::Content;
use troupe_core::event::Event;
use troupe_core::memory::MemoryService;
use troupe_core::session::SessionKey;
use troupe_core::state::{StateKey, StateMap};
use troupe_core::tool::ToolContext;

use crate::error::AgentError;

/// Sends produced events toward the runner, which appends them to the
/// session before forwarding them to the caller.
#[derive(Clone)]
pub(crate) struct EventEmitter {
    tx: mpsc::Sender<Event>,
    cancellation: CancellationToken,
}

impl EventEmitter {
    pub(crate) fn new(tx: mpsc::Sender<Event>, cancellation: CancellationToken) -> Self {
        Self { tx, cancellation }
    }

    /// Emit one event. A closed channel means the consumer stopped
    /// reading; that cancels the run so in-flight work stops instead of
    /// blocking the producer indefinitely.
    pub(crate) async fn emit(&self, event: Event) -> Result<(), AgentError> {
        if self.tx.send(event).await.is_err() {
            self.cancellation.cancel();
            return Err(AgentError::Cancelled);
        }
        Ok(())
    }
}

/// Request-scoped state threaded through one run of the agent tree.
pub struct ExecutionContext {
    pub(crate) session: SessionKey,
    pub(crate) invocation_id: String,
    pub(crate) user_content: Content,
    /// The working context map, visible to instruction rendering
    pub(crate) state: StateMap,
    /// Writes made since this context (or its snapshot) was created
    pub(crate) state_delta: StateMap,
    /// Conversation so far: session history plus content produced this run
    pub(crate) history: Vec<Content>,
    pub(crate) emitter: EventEmitter,
    pub(crate) cancellation: CancellationToken,
    pub(crate) memory: Option<Arc<dyn MemoryService>>,
}

impl ExecutionContext {
    pub(crate) fn new(
        session: SessionKey,
        invocation_id: String,
        user_content: Content,
        state: StateMap,
        history: Vec<Content>,
        emitter: EventEmitter,
        cancellation: CancellationToken,
        memory: Option<Arc<dyn MemoryService>>,
    ) -> Self {
        Self {
            session,
            invocation_id,
            user_content,
            state,
            state_delta: StateMap::new(),
            history,
            emitter,
            cancellation,
            memory,
        }
    }

    /// A snapshot for one parallel child: same incoming state and
    /// history, fresh delta. Nothing a sibling writes is visible here.
    pub(crate) fn child_snapshot(&self) -> Self {
        Self {
            session: self.session.clone(),
            invocation_id: self.invocation_id.clone(),
            user_content: self.user_content.clone(),
            state: self.state.clone(),
            state_delta: StateMap::new(),
            history: self.history.clone(),
            emitter: self.emitter.clone(),
            cancellation: self.cancellation.clone(),
            memory: self.memory.clone(),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub(crate) async fn emit(&self, event: Event) -> Result<(), AgentError> {
        self.emitter.emit(event).await
    }

    /// Record a context-map write in both the working map and the delta
    pub(crate) fn put_state(&mut self, key: StateKey, value: impl Into<String>) {
        let value = value.into();
        self.state.insert(key.clone(), value.clone());
        self.state_delta.insert(key, value);
    }

    /// Build the invocation context handed to tools of the given agent
    pub(crate) fn tool_context(&self, agent_name: &str) -> ToolContext {
        let mut ctx = ToolContext::new(
            agent_name,
            self.invocation_id.clone(),
            self.session.clone(),
            self.state.clone(),
        )
        .with_cancellation(self.cancellation.clone());
        if let Some(memory) = &self.memory {
            ctx = ctx.with_memory(Arc::clone(memory));
        }
        ctx
    }
}
