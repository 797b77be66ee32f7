//! Session storage
//!
//! Durable storage is an external collaborator; the core only needs to
//! append messages and read them back in order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::Role;

/// A message as persisted by a [`SessionStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Position in the session, starting at zero
    pub index: usize,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only message storage keyed by session id
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append a message to the session
    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> anyhow::Result<()>;

    /// Messages of the session starting at `since_index`, in order
    async fn get_messages(
        &self,
        session_id: &str,
        since_index: usize,
    ) -> anyhow::Result<Vec<StoredMessage>>;
}

/// Thread-safe in-memory store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<StoredMessage>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session and return its id
    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.write().insert(id.clone(), Vec::new());
        id
    }

    /// Number of stored messages, zero for unknown sessions
    pub fn message_count(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .get(session_id)
            .map(|messages| messages.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn add_message(&self, session_id: &str, role: Role, content: &str) -> anyhow::Result<()> {
        let mut sessions = self.sessions.write();
        let Some(messages) = sessions.get_mut(session_id) else {
            anyhow::bail!("session not found: {}", session_id);
        };
        messages.push(StoredMessage {
            index: messages.len(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn get_messages(
        &self,
        session_id: &str,
        since_index: usize,
    ) -> anyhow::Result<Vec<StoredMessage>> {
        let sessions = self.sessions.read();
        let Some(messages) = sessions.get(session_id) else {
            anyhow::bail!("session not found: {}", session_id);
        };
        Ok(messages.iter().skip(since_index).cloned().collect())
    }
}
