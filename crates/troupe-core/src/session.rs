//! Sessions: the per-user, per-application conversational state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::event::Event;
use crate::state::StateMap;

/// Identity of a session: the (application, user, session) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    /// Owning application
    pub app_name: String,

    /// Owning user within the application
    pub user_id: String,

    /// Session identifier, unique per (app, user)
    pub session_id: String,
}

impl SessionKey {
    /// Create a session key
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// A session: an append-only event log plus the shared context map.
///
/// Sessions are created explicitly before first use and live until
/// deleted or the store is torn down. The event order is insertion
/// order and is significant; `state` is derived by applying each
/// appended event's state delta in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The session's identity
    pub key: SessionKey,

    /// Ordered event log
    pub events: Vec<Event>,

    /// The shared context map
    pub state: StateMap,
}

impl Session {
    /// Create an empty session for the given key
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            events: Vec::new(),
            state: StateMap::new(),
        }
    }

    /// The most recently appended event, if any
    pub fn last_event(&self) -> Option<&Event> {
        self.events.last()
    }

    /// The sequence number the next appended event will receive
    pub fn next_sequence(&self) -> u64 {
        self.events.len() as u64 + 1
    }
}

/// Persistence boundary for sessions.
///
/// Implementations must serialize appends per session identity (one run
/// may not interleave appends to the same session with another run)
/// while letting unrelated sessions proceed independently. The in-memory
/// implementation in [`crate::in_memory`] is the normative contract; a
/// durable backend must honor the same semantics.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new, empty session. Fails with
    /// [`SessionError::AlreadyExists`] if the key is taken.
    async fn create(&self, key: SessionKey) -> Result<Session, SessionError>;

    /// Fetch a snapshot of a session: its ordered events plus context map.
    async fn get(&self, key: &SessionKey) -> Result<Session, SessionError>;

    /// Append an event, assigning its sequence number and applying its
    /// state delta. Returns the stored event.
    async fn append(&self, key: &SessionKey, event: Event) -> Result<Event, SessionError>;

    /// List session keys for an (application, user) pair.
    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<SessionKey>, SessionError>;

    /// Delete a session. Deleting a missing session is not an error.
    async fn delete(&self, key: &SessionKey) -> Result<(), SessionError>;
}
