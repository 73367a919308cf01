//! Memory: searchable recall over previously ingested sessions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::session::Session;

/// A read-only snapshot of one piece of session text, keyed for search.
///
/// Fragments are derived when a completed session is submitted to the
/// memory service and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryFragment {
    /// Session the fragment came from
    pub session_id: String,

    /// Agent (or user) that produced the text
    pub author: String,

    /// The fragment text
    pub text: String,
}

/// Result of a memory search.
///
/// An empty response is the explicit "no results" outcome; it is distinct
/// from a search error, which is reported as [`MemoryError::SearchFailed`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Matched fragments in deterministic store order
    pub fragments: Vec<MemoryFragment>,
}

impl SearchResponse {
    /// Whether the search matched nothing
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of matched fragments
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// The matched fragment texts, in result order
    pub fn texts(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

/// The memory boundary: ingestion of completed sessions and search over
/// previously ingested ones.
///
/// Implementations must de-duplicate by session identity (re-ingesting a
/// session replaces its prior record), return results in a deterministic
/// order for a fixed store state, and never repeat identical fragment
/// text within one result set.
#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Ingest a completed session's textual content, replacing any record
    /// previously ingested for the same session identity.
    async fn add_session(&self, session: &Session) -> Result<(), MemoryError>;

    /// Search ingested sessions belonging to (app, user) for fragments
    /// matching the query.
    async fn search(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<SearchResponse, MemoryError>;
}
