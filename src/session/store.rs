//! Session storage and management.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{ContextId, SessionId};
use crate::chat::ChatSession;
use crate::error::RelayError;
use crate::Result;

/// A stored conversational context for one game.
#[derive(Clone)]
pub struct SessionEntry {
    /// Identifies this particular context; changes when a session is recreated.
    pub context_id: ContextId,
    /// Color the model was assigned when the context was created.
    pub color: String,
    /// Handle to the conversation.
    pub chat: Arc<dyn ChatSession>,
    /// Time of last activity.
    pub last_activity: Instant,
}

impl SessionEntry {
    fn new(color: &str, chat: Arc<dyn ChatSession>) -> Self {
        Self {
            context_id: ContextId::next(),
            color: color.to_string(),
            chat,
            last_activity: Instant::now(),
        }
    }

    /// Update the last activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Get the idle duration since last activity.
    pub fn idle_duration(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

impl std::fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEntry")
            .field("context_id", &self.context_id)
            .field("color", &self.color)
            .field("last_activity", &self.last_activity)
            .finish_non_exhaustive()
    }
}

/// Thread-safe map from session identifier to conversational context.
///
/// Lookup-or-create runs entirely under the write lock, so concurrent first
/// requests for the same session install exactly one context.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionStore {
    /// Create a new empty session store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return the context stored for `id`, creating it with `create` if absent.
    ///
    /// An existing context is returned unchanged (even if `color` differs from
    /// the color it was created with) so the conversation history survives.
    pub fn get_or_create<F>(&self, id: &SessionId, color: &str, create: F) -> Result<SessionEntry>
    where
        F: FnOnce(&str) -> Arc<dyn ChatSession>,
    {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RelayError::LockPoisoned)?;

        if let Some(entry) = sessions.get_mut(id) {
            entry.touch();
            debug!(session = %id, context = %entry.context_id, "reusing chat context");
            return Ok(entry.clone());
        }

        let entry = SessionEntry::new(color, create(color));
        info!(session = %id, context = %entry.context_id, color, "created chat context");
        sessions.insert(id.clone(), entry.clone());
        Ok(entry)
    }

    /// Get a clone of the entry stored under `id`.
    pub fn get(&self, id: &SessionId) -> Result<Option<SessionEntry>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RelayError::LockPoisoned)?;
        Ok(sessions.get(id).cloned())
    }

    /// Check if a session exists.
    pub fn contains(&self, id: &SessionId) -> Result<bool> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RelayError::LockPoisoned)?;
        Ok(sessions.contains_key(id))
    }

    /// Remove a session from the store.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, id: &SessionId) -> Result<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RelayError::LockPoisoned)?;
        Ok(sessions.remove(id).is_some())
    }

    /// Remove the session only if it still holds the given context.
    ///
    /// A context that has already been replaced is left alone.
    pub fn remove_context(&self, id: &SessionId, context_id: ContextId) -> Result<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RelayError::LockPoisoned)?;

        match sessions.get(id) {
            Some(entry) if entry.context_id == context_id => {
                sessions.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Get the number of sessions in the store.
    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Remove all sessions matching a predicate.
    ///
    /// Returns the number of sessions removed.
    pub fn remove_matching<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&SessionEntry) -> bool,
    {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RelayError::LockPoisoned)?;

        let before = sessions.len();
        sessions.retain(|_, entry| !predicate(entry));
        Ok(before - sessions.len())
    }

    /// Remove sessions idle for longer than `max_idle`.
    pub fn remove_idle(&self, max_idle: Duration) -> Result<usize> {
        self.remove_matching(|entry| entry.idle_duration() > max_idle)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically evict sessions idle for longer than `ttl`.
pub fn spawn_idle_sweeper(store: Arc<SessionStore>, ttl: Duration) -> tokio::task::JoinHandle<()> {
    let period = ttl.min(Duration::from_secs(60)).max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match store.remove_idle(ttl) {
                Ok(0) => {}
                Ok(removed) => info!(removed, "evicted idle chat contexts"),
                Err(e) => tracing::error!("idle sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Silent;

    #[async_trait]
    impl ChatSession for Silent {
        async fn send_message(&self, _text: &str) -> std::result::Result<String, ChatError> {
            Ok(String::new())
        }
    }

    fn silent(_color: &str) -> Arc<dyn ChatSession> {
        Arc::new(Silent)
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let store = SessionStore::new();
        let id = SessionId::from("game-1");

        let first = store.get_or_create(&id, "white", silent).unwrap();
        let second = store.get_or_create(&id, "white", silent).unwrap();

        assert_eq!(first.context_id, second.context_id);
        assert!(Arc::ptr_eq(&first.chat, &second.chat));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_existing_context_keeps_original_color() {
        let store = SessionStore::new();
        let id = SessionId::from("game-1");

        store.get_or_create(&id, "black", silent).unwrap();
        let again = store.get_or_create(&id, "white", silent).unwrap();

        assert_eq!(again.color, "black");
    }

    #[test]
    fn test_factory_receives_color_once() {
        let store = SessionStore::new();
        let id = SessionId::from("game-1");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            store
                .get_or_create(&id, "black", |color| {
                    assert_eq!(color, "black");
                    calls.fetch_add(1, Ordering::SeqCst);
                    silent(color)
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_then_recreate_gives_fresh_context() {
        let store = SessionStore::new();
        let id = SessionId::from("game-1");

        let before = store.get_or_create(&id, "white", silent).unwrap();
        assert!(store.remove(&id).unwrap());
        assert!(!store.contains(&id).unwrap());

        let after = store.get_or_create(&id, "white", silent).unwrap();
        assert_ne!(before.context_id, after.context_id);
    }

    #[test]
    fn test_remove_nonexistent() {
        let store = SessionStore::new();
        assert!(!store.remove(&SessionId::from("nope")).unwrap());
    }

    #[test]
    fn test_get_nonexistent() {
        let store = SessionStore::new();
        assert!(store.get(&SessionId::from("nope")).unwrap().is_none());
    }

    #[test]
    fn test_remove_context_ignores_replaced_context() {
        let store = SessionStore::new();
        let id = SessionId::from("game-1");

        let stale = store.get_or_create(&id, "white", silent).unwrap();
        store.remove(&id).unwrap();
        let fresh = store.get_or_create(&id, "white", silent).unwrap();

        assert!(!store.remove_context(&id, stale.context_id).unwrap());
        assert!(store.contains(&id).unwrap());
        assert!(store.remove_context(&id, fresh.context_id).unwrap());
        assert!(!store.contains(&id).unwrap());
    }

    #[test]
    fn test_remove_matching() {
        let store = SessionStore::new();
        store
            .get_or_create(&SessionId::from("a"), "white", silent)
            .unwrap();
        store
            .get_or_create(&SessionId::from("b"), "black", silent)
            .unwrap();

        let removed = store.remove_matching(|e| e.color == "black").unwrap();

        assert_eq!(removed, 1);
        assert!(store.contains(&SessionId::from("a")).unwrap());
    }

    #[test]
    fn test_remove_idle() {
        let store = SessionStore::new();
        store
            .get_or_create(&SessionId::from("old"), "white", silent)
            .unwrap();
        std::thread::sleep(Duration::from_millis(30));
        store
            .get_or_create(&SessionId::from("new"), "white", silent)
            .unwrap();

        let removed = store.remove_idle(Duration::from_millis(20)).unwrap();

        assert_eq!(removed, 1);
        assert!(store.contains(&SessionId::from("new")).unwrap());
    }

    #[test]
    fn test_concurrent_first_access_creates_one_context() {
        use std::thread;

        let store = Arc::new(SessionStore::new());
        let created = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(64));
        let mut handles = vec![];

        for _ in 0..64 {
            let store = Arc::clone(&store);
            let created = Arc::clone(&created);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                store
                    .get_or_create(&SessionId::from("race"), "white", |color| {
                        created.fetch_add(1, Ordering::SeqCst);
                        silent(color)
                    })
                    .unwrap()
                    .context_id
            }));
        }

        let ids: Vec<ContextId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 1);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(store.count(), 1);
    }
}
