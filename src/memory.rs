//! Optional memory/indexing collaborator.
//!
//! The core only needs add and search; storage and ranking live behind the
//! trait. `InMemoryStore` backs tests and single-process sessions.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMessage {
    pub role: String,
    pub content: String,
}

impl MemoryMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHit {
    pub content: String,
    pub metadata: Value,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn add(&self, messages: &[MemoryMessage], user_id: &str, metadata: Value) -> Result<()>;

    async fn search(
        &self,
        query: &str,
        user_id: &str,
        filters: Option<Value>,
        limit: usize,
    ) -> Result<Vec<MemoryHit>>;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    user_id: String,
    content: String,
    metadata: Value,
}

/// Substring-match store; good enough for tests and single-session recall.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<Vec<StoredEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn add(&self, messages: &[MemoryMessage], user_id: &str, metadata: Value) -> Result<()> {
        let mut entries = self.entries.lock().expect("memory store poisoned");
        for message in messages {
            entries.push(StoredEntry {
                user_id: user_id.to_string(),
                content: message.content.clone(),
                metadata: metadata.clone(),
            });
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        user_id: &str,
        _filters: Option<Value>,
        limit: usize,
    ) -> Result<Vec<MemoryHit>> {
        let entries = self.entries.lock().expect("memory store poisoned");
        let hits = entries
            .iter()
            .filter(|e| e.user_id == user_id && e.content.contains(query))
            .take(limit)
            .map(|e| MemoryHit {
                content: e.content.clone(),
                metadata: e.metadata.clone(),
            })
            .collect();
        Ok(hits)
    }
}
