//! Shared run state: validated keys, the context map, and instruction
//! placeholder rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// Validated key into the shared context map.
///
/// `StateKey` is a newtype wrapper around `String` that enforces naming
/// conventions and length limits, so that output keys and instruction
/// placeholders cannot silently diverge through typos or stray whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateKey(String);

/// Errors that can occur when creating a `StateKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidStateKey {
    /// Key is empty or contains only whitespace.
    Empty,
    /// Key exceeds the maximum allowed length.
    TooLong(usize),
    /// Key contains invalid characters.
    InvalidChars(String),
}

impl std::fmt::Display for InvalidStateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidStateKey::Empty => write!(f, "State key cannot be empty"),
            InvalidStateKey::TooLong(len) => {
                write!(f, "State key too long: {} characters (max 128)", len)
            }
            InvalidStateKey::InvalidChars(key) => {
                write!(f, "State key contains invalid characters: '{}'", key)
            }
        }
    }
}

impl std::error::Error for InvalidStateKey {}

impl StateKey {
    /// Maximum allowed length for state keys.
    pub const MAX_LENGTH: usize = 128;

    /// Create a new validated state key.
    ///
    /// Keys must be non-empty, at most 128 characters, and consist of
    /// alphanumeric characters, underscores, hyphens, dots, and colons.
    pub fn new(key: &str) -> Result<Self, InvalidStateKey> {
        if key.trim().is_empty() {
            return Err(InvalidStateKey::Empty);
        }
        if key.len() > Self::MAX_LENGTH {
            return Err(InvalidStateKey::TooLong(key.len()));
        }
        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
        {
            return Err(InvalidStateKey::InvalidChars(key.to_string()));
        }
        Ok(StateKey(key.to_string()))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for StateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for StateKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for StateKey {
    type Error = InvalidStateKey;

    fn try_from(key: &str) -> Result<Self, Self::Error> {
        StateKey::new(key)
    }
}

impl TryFrom<String> for StateKey {
    type Error = InvalidStateKey;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        StateKey::new(&key)
    }
}

impl From<StateKey> for String {
    fn from(key: StateKey) -> Self {
        key.0
    }
}

/// The shared context map populated by agents that declare an output key.
///
/// A `StateMap` is owned by the session and by the per-run execution
/// context; it is never a process-wide singleton. Values written by one
/// pipeline stage become visible to later stages through `{key}`
/// substitution in their instructions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMap(HashMap<StateKey, String>);

impl StateMap {
    /// Create an empty state map.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    /// Whether the map contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert a value, replacing any existing one.
    pub fn insert(&mut self, key: StateKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    /// Copy every entry of `other` into this map, overwriting on conflict.
    pub fn merge(&mut self, other: &StateMap) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }
}

impl FromIterator<(StateKey, String)> for StateMap {
    fn from_iter<I: IntoIterator<Item = (StateKey, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Render an instruction template against the current context map.
///
/// Every `{key}` placeholder is replaced with the map's value for `key`.
/// A doubled brace (`{{` or `}}`) renders a literal brace. Referencing a
/// key that no earlier pipeline stage populated fails with
/// [`TemplateError::MissingContextKey`]; this only happens when pipeline
/// ordering is wrong.
pub fn render_instruction(template: &str, state: &StateMap) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if let Some((_, '{')) = chars.peek() {
                    chars.next();
                    rendered.push('{');
                    continue;
                }
                let mut key = String::new();
                let mut closed = false;
                for (_, k) in chars.by_ref() {
                    if k == '}' {
                        closed = true;
                        break;
                    }
                    key.push(k);
                }
                if !closed {
                    return Err(TemplateError::UnclosedPlaceholder { position });
                }
                if key.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder { position });
                }
                match state.get(&key) {
                    Some(value) => rendered.push_str(value),
                    None => return Err(TemplateError::MissingContextKey { key }),
                }
            }
            '}' => {
                if let Some((_, '}')) = chars.peek() {
                    chars.next();
                }
                rendered.push('}');
            }
            other => rendered.push(other),
        }
    }

    Ok(rendered)
}
