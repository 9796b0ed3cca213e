//! Session store port.
//!
//! The production store is an external key-value service with TTL-based
//! expiry; this crate only requires get/save/delete with full-overwrite
//! semantics, atomic per call.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::discovery::ChatSession;
use crate::domain::foundation::SessionId;

/// Session store failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error("storage backend failed: {0}")]
    Backend(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Port for session persistence.
///
/// `save` is a full overwrite of the record; the core never issues partial
/// updates. Callers must not run concurrent writers for one session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session, `None` when absent or expired.
    async fn get(&self, id: &SessionId) -> Result<Option<ChatSession>, StoreError>;

    /// Persists the full session record.
    async fn save(&self, session: &ChatSession) -> Result<(), StoreError>;

    /// Deletes a session record. Deleting an absent session is not an error.
    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;
}
