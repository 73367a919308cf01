//! In-memory session and memory stores.
//!
//! These implementations are the normative contract for the persistence
//! boundaries: fast, transient, and suitable for development, testing,
//! and single-process deployments. All data is lost when the process
//! terminates.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{MemoryError, SessionError};
use crate::event::Event;
use crate::memory::{MemoryFragment, MemoryService, SearchResponse};
use crate::session::{Session, SessionKey, SessionStore};

/// In-memory session store.
///
/// Each session sits behind its own async mutex, so appends to one
/// session identity are serialized while unrelated sessions proceed
/// independently. The outer map lock is held only long enough to look
/// the session up.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, Arc<Mutex<Session>>>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, key: &SessionKey) -> Result<Arc<Mutex<Session>>, SessionError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(key)
            .cloned()
            .ok_or_else(|| SessionError::NotFound { key: key.clone() })
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, key: SessionKey) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&key) {
            return Err(SessionError::AlreadyExists { key });
        }
        let session = Session::new(key.clone());
        sessions.insert(key.clone(), Arc::new(Mutex::new(session.clone())));
        debug!(session = %key, "Created session");
        Ok(session)
    }

    async fn get(&self, key: &SessionKey) -> Result<Session, SessionError> {
        let entry = self.entry(key).await?;
        let session = entry.lock().await;
        Ok(session.clone())
    }

    async fn append(&self, key: &SessionKey, mut event: Event) -> Result<Event, SessionError> {
        let entry = self.entry(key).await?;
        let mut session = entry.lock().await;
        event.sequence = session.next_sequence();
        session.state.merge(&event.state_delta);
        session.events.push(event.clone());
        Ok(event)
    }

    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<SessionKey>, SessionError> {
        let sessions = self.sessions.read().await;
        let mut keys: Vec<SessionKey> = sessions
            .keys()
            .filter(|k| k.app_name == app_name && k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(keys)
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(key);
        Ok(())
    }
}

/// In-memory memory service with content-containment search.
///
/// The query is split on whitespace and a fragment matches when it
/// contains any of the tokens; this keeps short natural-language queries
/// useful without a ranking index. Records are keyed by session identity,
/// so re-ingesting a session replaces its prior record.
#[derive(Default)]
pub struct InMemoryMemoryService {
    records: RwLock<HashMap<SessionKey, Vec<MemoryFragment>>>,
}

impl InMemoryMemoryService {
    /// Create an empty service
    pub fn new() -> Self {
        Self::default()
    }

    fn fragments_of(session: &Session) -> Vec<MemoryFragment> {
        session
            .events
            .iter()
            .filter_map(|event| {
                let text = event.text();
                if text.trim().is_empty() {
                    None
                } else {
                    Some(MemoryFragment {
                        session_id: session.key.session_id.clone(),
                        author: event.author.clone(),
                        text,
                    })
                }
            })
            .collect()
    }
}

#[async_trait]
impl MemoryService for InMemoryMemoryService {
    async fn add_session(&self, session: &Session) -> Result<(), MemoryError> {
        let fragments = Self::fragments_of(session);
        let mut records = self.records.write().await;
        debug!(session = %session.key, fragments = fragments.len(), "Ingested session into memory");
        records.insert(session.key.clone(), fragments);
        Ok(())
    }

    async fn search(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<SearchResponse, MemoryError> {
        let tokens: Vec<&str> = query.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(SearchResponse::default());
        }

        let records = self.records.read().await;

        // Deterministic result order for a fixed store state: sessions by
        // id, fragments in event order within each session.
        let mut keys: Vec<&SessionKey> = records
            .keys()
            .filter(|k| k.app_name == app_name && k.user_id == user_id)
            .collect();
        keys.sort_by(|a, b| a.session_id.cmp(&b.session_id));

        let mut seen: HashSet<&str> = HashSet::new();
        let mut fragments = Vec::new();
        for key in keys {
            for fragment in &records[key] {
                if !tokens.iter().any(|t| fragment.text.contains(t)) {
                    continue;
                }
                if seen.insert(fragment.text.as_str()) {
                    fragments.push(fragment.clone());
                }
            }
        }

        Ok(SearchResponse { fragments })
    }
}
