//! Session events: immutable, ordered units of produced output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::Content;
use crate::state::StateMap;

/// One unit of observable output within a session.
///
/// Events are appended to a session in production order and are immutable
/// once appended. The `sequence` number is assigned by the session store
/// at append time and increases monotonically within a session.
///
/// An event may carry a `state_delta`: the output-key writes its producer
/// made. The session store applies the delta to the session's context map
/// when the event is appended, so the session state is always derivable
/// from the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique event identifier
    pub id: String,

    /// Name of the producing agent (or `user` for user turns)
    pub author: String,

    /// The content payload
    pub content: Content,

    /// Context-map writes carried by this event
    #[serde(default, skip_serializing_if = "StateMap::is_empty")]
    pub state_delta: StateMap,

    /// When the event was produced
    pub timestamp: DateTime<Utc>,

    /// Position within the session, assigned at append; zero until appended
    #[serde(default)]
    pub sequence: u64,
}

impl Event {
    /// Create a new event. The sequence number stays zero until the
    /// session store assigns one at append.
    pub fn new(author: impl Into<String>, content: Content) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author: author.into(),
            content,
            state_delta: StateMap::new(),
            timestamp: Utc::now(),
            sequence: 0,
        }
    }

    /// Attach context-map writes to this event
    pub fn with_state_delta(mut self, delta: StateMap) -> Self {
        self.state_delta = delta;
        self
    }

    /// Join the event content's text parts
    pub fn text(&self) -> String {
        self.content.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_events_start_unsequenced() {
        let event = Event::new("scout", Content::agent_text("three restaurants"));
        assert_eq!(event.sequence, 0);
        assert_eq!(event.author, "scout");
        assert_eq!(event.text(), "three restaurants");
        assert!(event.state_delta.is_empty());
    }

    #[test]
    fn distinct_events_get_distinct_ids() {
        let a = Event::new("a", Content::agent_text("x"));
        let b = Event::new("a", Content::agent_text("x"));
        assert_ne!(a.id, b.id);
    }
}
