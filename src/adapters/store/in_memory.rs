//! In-memory session store adapter.
//!
//! Stores sessions in a shared map. Useful for testing and development; the
//! production deployment points this port at an external key-value store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::discovery::ChatSession;
use crate::domain::foundation::SessionId;
use crate::ports::{SessionStore, StoreError};

/// In-memory storage for chat sessions.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, ChatSession>>>,
}

impl InMemorySessionStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored sessions (useful for tests).
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Get the number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// True when no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<ChatSession>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).cloned())
    }

    async fn save(&self, session: &ChatSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn session() -> ChatSession {
        ChatSession::start(UserId::new("traveler-1").unwrap())
    }

    #[tokio::test]
    async fn save_and_get_round_trips() {
        let store = InMemorySessionStore::new();
        let session = session();

        store.save(&session).await.unwrap();
        let loaded = store.get(session.id()).await.unwrap();

        assert_eq!(loaded, Some(session));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.get(&SessionId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_overwrites_the_full_record() {
        let store = InMemorySessionStore::new();
        let mut session = session();
        store.save(&session).await.unwrap();

        session.record_user_message("oi").unwrap();
        store.save(&session).await.unwrap();

        let loaded = store.get(session.id()).await.unwrap().unwrap();
        assert_eq!(loaded.messages().len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let store = InMemorySessionStore::new();
        let session = session();
        store.save(&session).await.unwrap();

        store.delete(session.id()).await.unwrap();

        assert_eq!(store.get(session.id()).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_missing_is_not_an_error() {
        let store = InMemorySessionStore::new();
        assert!(store.delete(&SessionId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn sessions_are_isolated_by_id() {
        let store = InMemorySessionStore::new();
        let first = session();
        let second = session();

        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.get(first.id()).await.unwrap(), Some(first));
    }
}
