//! In-memory backend — single-process, process-lifetime, no persistence
//! guarantee across restarts. Appropriate for the stated scope; a production
//! system would back this with durable storage.

use async_trait::async_trait;
use charloom_core::error::StoreError;
use charloom_core::state::ConversationState;
use charloom_core::store::{ConversationKey, ConversationStore};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::debug;

struct Entry {
    state: ConversationState,
    last_accessed: Instant,
}

/// An in-memory store with LRU eviction past a key cap.
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    max_conversations: usize,
}

impl InMemoryStore {
    pub fn new(max_conversations: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_conversations: max_conversations.max(1),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, key: &ConversationKey) -> Result<ConversationState, StoreError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key.as_str()) {
            Some(entry) => {
                entry.last_accessed = Instant::now();
                Ok(entry.state.clone())
            }
            None => Ok(ConversationState::new()),
        }
    }

    async fn save(
        &self,
        key: &ConversationKey,
        state: ConversationState,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;

        // Evict the least-recently-used key when inserting a new one at cap.
        if entries.len() >= self.max_conversations && !entries.contains_key(key.as_str()) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone())
            {
                debug!(key = %oldest, "Evicting least-recently-used conversation state");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key.as_str().to_string(),
            Entry {
                state,
                last_accessed: Instant::now(),
            },
        );
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().await.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_creates_default_state_lazily() {
        let store = InMemoryStore::default();
        let key = ConversationKey::from("alice:mira");

        let state = store.load(&key).await.unwrap();
        assert!(state.emotion_history.is_empty());
        assert!(state.feedback_log.is_empty());

        // Lazy: nothing is tracked until the first save.
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let store = InMemoryStore::default();
        let key = ConversationKey::from("bob:kael");

        let mut state = ConversationState::new();
        state.push_emotion("joy");
        store.save(&key, state).await.unwrap();

        let loaded = store.load(&key).await.unwrap();
        assert_eq!(loaded.emotion_history, vec!["joy".to_string()]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lru_eviction_at_cap() {
        let store = InMemoryStore::new(2);

        let first = ConversationKey::from("first");
        let second = ConversationKey::from("second");
        let third = ConversationKey::from("third");

        store.save(&first, ConversationState::new()).await.unwrap();
        store.save(&second, ConversationState::new()).await.unwrap();

        // Touch "first" so "second" becomes the LRU candidate.
        store.load(&first).await.unwrap();

        store.save(&third, ConversationState::new()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        // "second" was evicted: loading it yields a fresh default.
        let mut tagged = ConversationState::new();
        tagged.push_emotion("sadness");
        store.save(&first, tagged).await.unwrap();
        let first_back = store.load(&first).await.unwrap();
        assert_eq!(first_back.emotion_history.len(), 1);

        let second_back = store.load(&second).await.unwrap();
        assert!(second_back.emotion_history.is_empty());
    }

    #[tokio::test]
    async fn saving_existing_key_does_not_evict() {
        let store = InMemoryStore::new(2);
        let a = ConversationKey::from("a");
        let b = ConversationKey::from("b");

        store.save(&a, ConversationState::new()).await.unwrap();
        store.save(&b, ConversationState::new()).await.unwrap();
        store.save(&a, ConversationState::new()).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let store = InMemoryStore::default();
        store
            .save(&ConversationKey::from("x"), ConversationState::new())
            .await
            .unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
