//! Session and conversation identifier types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Global counter for context ID generation.
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Caller-supplied identifier naming one ongoing game.
///
/// The value is opaque to the relay; it is only compared and hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique identifier for one conversational context.
///
/// Context IDs are generated using an atomic counter, so every context created
/// during the process lifetime gets a distinct value. A session that is removed
/// and recreated therefore reports a new context ID. Displayed as `ctx-XXXXXXXX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Create a new unique context ID.
    pub fn next() -> Self {
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_context_id_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..10_000 {
            let id = ContextId::next();
            assert!(ids.insert(id), "Duplicate ID generated: {}", id);
        }
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_context_id_display_format() {
        assert_eq!(ContextId(255).to_string(), "ctx-000000ff");
        assert_eq!(ContextId(0x12345678).to_string(), "ctx-12345678");
    }

    #[test]
    fn test_session_id_is_opaque() {
        let id = SessionId::from("Game 7 / white");
        assert_eq!(id.as_str(), "Game 7 / white");
        assert_eq!(id.to_string(), "Game 7 / white");
    }

    #[test]
    fn test_session_id_serde_transparent() {
        let id: SessionId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(id, SessionId::from("abc-123"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");
    }

    #[test]
    fn test_session_id_hash_eq() {
        let mut set = HashSet::new();
        set.insert(SessionId::from("a"));
        assert!(set.contains(&SessionId::from("a")));
        assert!(!set.contains(&SessionId::from("b")));
    }
}
