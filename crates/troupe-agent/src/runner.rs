//! The runner: drives one agent tree over one session.
//!
//! `Runner::run` loads the session, appends the user's content as an
//! event, executes the root agent on a driver task, and hands the caller
//! a finite stream of events. Every produced event is appended to the
//! session (and assigned its sequence number) before it is forwarded,
//! so partial progress is observable even when a run fails.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use troupe_core::content::Content;
use troupe_core::error::{ConfigError, SessionError};
use troupe_core::event::Event;
use troupe_core::memory::MemoryService;
use troupe_core::session::{SessionKey, SessionStore};

use crate::agent::Agent;
use crate::context::{EventEmitter, ExecutionContext};
use crate::error::{AgentError, RunError};

/// Author recorded on events carrying the user's own content.
pub const USER_AUTHOR: &str = "user";

/// Size of the bounded channels between agents, runner, and caller.
const EVENT_CHANNEL_SIZE: usize = 64;

/// Configuration for a [`Runner`].
pub struct RunnerConfig {
    /// Application name; the first component of every session key
    pub app_name: String,

    /// Root of the agent tree
    pub agent: Arc<Agent>,

    /// Where sessions live
    pub session_store: Arc<dyn SessionStore>,

    /// Optional memory service; when set, the full session is flushed to
    /// it on every terminal outcome
    pub memory: Option<Arc<dyn MemoryService>>,

    /// Whole-run timeout; expiry cancels in-flight work exactly as an
    /// explicit cancellation would
    pub run_timeout: Option<Duration>,
}

impl RunnerConfig {
    /// Start a config with the required fields
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<Agent>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            session_store,
            memory: None,
            run_timeout: None,
        }
    }

    /// Attach a memory service
    pub fn with_memory(mut self, memory: Arc<dyn MemoryService>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Set the whole-run timeout
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }
}

/// Per-run options.
#[derive(Default)]
pub struct RunOptions {
    /// External cancellation token; keep a clone to cancel the run
    pub cancellation: Option<CancellationToken>,
}

/// Drives an agent tree over sessions of one application.
pub struct Runner {
    app_name: String,
    agent: Arc<Agent>,
    session_store: Arc<dyn SessionStore>,
    memory: Option<Arc<dyn MemoryService>>,
    run_timeout: Option<Duration>,
    /// One run at a time per session identity: a run's appends must not
    /// interleave with another run's. Unrelated sessions proceed
    /// independently.
    run_locks: tokio::sync::Mutex<HashMap<SessionKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl Runner {
    /// Validate the wiring and build a runner.
    pub fn new(config: RunnerConfig) -> Result<Self, ConfigError> {
        if config.app_name.trim().is_empty() {
            return Err(ConfigError::InvalidAppName {
                name: config.app_name,
                reason: "app name cannot be empty".to_string(),
            });
        }
        Ok(Self {
            app_name: config.app_name,
            agent: config.agent,
            session_store: config.session_store,
            memory: config.memory,
            run_timeout: config.run_timeout,
            run_locks: tokio::sync::Mutex::new(HashMap::new()),
        })
    }

    /// Acquire the per-session run lock, held for the whole run.
    async fn session_guard(&self, key: &SessionKey) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.run_locks.lock().await;
            Arc::clone(
                locks
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// The application name
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// The root agent
    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    /// The session store
    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session_store
    }

    /// Run the root agent for one user turn.
    ///
    /// The session must have been created beforehand; sessions are
    /// created explicitly, never implicitly by a run.
    pub async fn run(
        &self,
        user_id: &str,
        session_id: &str,
        new_message: Content,
    ) -> Result<RunStream, RunError> {
        self.run_with_options(user_id, session_id, new_message, RunOptions::default())
            .await
    }

    /// Run with per-run options.
    pub async fn run_with_options(
        &self,
        user_id: &str,
        session_id: &str,
        new_message: Content,
        options: RunOptions,
    ) -> Result<RunStream, RunError> {
        let key = SessionKey::new(&self.app_name, user_id, session_id);
        let run_guard = self.session_guard(&key).await;
        let session = self.session_store.get(&key).await.map_err(|e| match e {
            SessionError::NotFound { key } => RunError::SessionNotFound { key },
            other => RunError::Session(other),
        })?;

        self.session_store
            .append(&key, Event::new(USER_AUTHOR, new_message.clone()))
            .await?;

        let token = options.cancellation.unwrap_or_default();
        let invocation_id = Uuid::new_v4().to_string();

        info!(
            session = %key,
            invocation = %invocation_id,
            agent = %self.agent.name(),
            "Starting run"
        );

        let history: Vec<Content> = session
            .events
            .iter()
            .map(|e| e.content.clone())
            .chain(std::iter::once(new_message.clone()))
            .collect();

        let (agent_tx, agent_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (out_tx, out_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

        let ctx = ExecutionContext::new(
            key.clone(),
            invocation_id,
            new_message,
            session.state.clone(),
            history,
            EventEmitter::new(agent_tx, token.clone()),
            token.clone(),
            self.memory.clone(),
        );

        // The execution context owns an event-channel sender; dropping it
        // inside the task is what lets the pump loop below observe the
        // end of the run.
        let root = Arc::clone(&self.agent);
        let exec_handle = tokio::spawn(async move { root.execute(ctx).await.map(drop) });

        if let Some(timeout) = self.run_timeout {
            let watchdog_token = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = watchdog_token.cancelled() => {}
                    _ = tokio::time::sleep(timeout) => {
                        warn!(timeout_ms = timeout.as_millis() as u64, "Run timeout exceeded; cancelling");
                        watchdog_token.cancel();
                    }
                }
            });
        }

        let store = Arc::clone(&self.session_store);
        let memory = self.memory.clone();
        let root_name = self.agent.name().to_string();
        let driver_token = token.clone();
        let driver_key = key;

        tokio::spawn(async move {
            // Held until the run, including its memory flush, is done.
            let _run_guard = run_guard;
            let mut agent_rx = agent_rx;
            let mut failed = false;

            while let Some(event) = agent_rx.recv().await {
                match store.append(&driver_key, event).await {
                    Ok(stored) => {
                        if out_tx.send(Ok(stored)).await.is_err() {
                            debug!(session = %driver_key, "Consumer dropped the stream; cancelling run");
                            driver_token.cancel();
                            failed = true;
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = out_tx.send(Err(RunError::Session(e))).await;
                        driver_token.cancel();
                        failed = true;
                        break;
                    }
                }
            }
            // Dropping the receiver makes any in-flight emit fail, which
            // propagates Cancelled through the tree.
            drop(agent_rx);

            let outcome = match exec_handle.await {
                Ok(Ok(_)) => None,
                Ok(Err(e)) if e.is_cancelled() => Some(RunError::Cancelled),
                Ok(Err(e)) => Some(RunError::Agent(e)),
                Err(join_err) => Some(RunError::Agent(AgentError::Internal {
                    agent: root_name,
                    message: join_err.to_string(),
                })),
            };

            match &outcome {
                None => debug!(session = %driver_key, "Run completed"),
                Some(err) => debug!(session = %driver_key, error = %err, "Run ended with terminal outcome"),
            }

            if let Some(err) = outcome {
                if !failed {
                    let _ = out_tx.send(Err(err)).await;
                }
            }

            // Flush the session to memory on every terminal outcome, so
            // recall sees exactly what the session log saw.
            if let Some(memory) = memory {
                match store.get(&driver_key).await {
                    Ok(session) => {
                        if let Err(e) = memory.add_session(&session).await {
                            warn!(session = %driver_key, error = %e, "Memory flush failed");
                        }
                    }
                    Err(e) => {
                        warn!(session = %driver_key, error = %e, "Could not load session for memory flush");
                    }
                }
            }
        });

        Ok(RunStream {
            rx: out_rx,
            cancellation: token,
        })
    }
}

/// A finite, non-restartable stream of run events.
///
/// Items arrive in production order; the stream ends after the terminal
/// outcome. A successful run ends with no trailing item; a failed or
/// cancelled run ends with one final `Err`. Dropping the stream early
/// cancels the run.
#[derive(Debug)]
pub struct RunStream {
    rx: mpsc::Receiver<Result<Event, RunError>>,
    cancellation: CancellationToken,
}

impl RunStream {
    /// Receive the next event or terminal outcome.
    pub async fn next_event(&mut self) -> Option<Result<Event, RunError>> {
        self.rx.recv().await
    }

    /// Cancel the run.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// The run's cancellation token.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Drain the stream, collecting events and the terminal outcome.
    pub async fn collect(mut self) -> (Vec<Event>, Option<RunError>) {
        let mut events = Vec::new();
        while let Some(item) = self.next_event().await {
            match item {
                Ok(event) => events.push(event),
                Err(err) => return (events, Some(err)),
            }
        }
        (events, None)
    }
}

impl futures::Stream for RunStream {
    type Item = Result<Event, RunError>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for RunStream {
    fn drop(&mut self) {
        // An abandoned stream must not leave the producer running.
        self.cancellation.cancel();
    }
}
