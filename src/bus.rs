//! Asynchronous request/response bus for in-process agent delegation.
//!
//! One handler per named channel, last registration wins. Every request gets
//! a fresh correlation id and a single-use pending slot; the slot is released
//! on success, timeout, and closed-channel paths alike. Responses arriving
//! after their slot expired are dropped with a debug log — at-most-once
//! delivery is the contract here.

use crate::agents::AgentType;
use crate::context::AgentContext;
use crate::error::{OrchestrationError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

/// Terminal status of a delegated task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A delegation request in flight on the bus.
///
/// `correlation_id` is assigned by the bus at dispatch time; any value set by
/// the caller is overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub correlation_id: Uuid,
    pub agent_type: AgentType,
    pub task: String,
    pub context: AgentContext,
}

impl TaskRequest {
    pub fn new(agent_type: AgentType, task: impl Into<String>, context: AgentContext) -> Self {
        Self {
            correlation_id: Uuid::nil(),
            agent_type,
            task: task.into(),
            context,
        }
    }
}

/// The structured outcome of a delegated task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationResult {
    pub agent_type: AgentType,
    pub task: String,
    /// Payload parsed from the agent's output: `result`, `shared_updates`,
    /// `next_actions`, `recommendations`.
    pub data: Value,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Serialized size of the filtered context the agent saw. Observability
    /// only, not correctness.
    #[serde(default)]
    pub context_size: usize,
    pub completed_at: DateTime<Utc>,
}

impl DelegationResult {
    pub fn completed(agent_type: AgentType, task: impl Into<String>, data: Value) -> Self {
        Self {
            agent_type,
            task: task.into(),
            data,
            status: TaskStatus::Completed,
            error: None,
            context_size: 0,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(agent_type: AgentType, task: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            agent_type,
            task: task.into(),
            data: Value::Null,
            status: TaskStatus::Failed,
            error: Some(error.into()),
            context_size: 0,
            completed_at: Utc::now(),
        }
    }

    pub fn with_context_size(mut self, size: usize) -> Self {
        self.context_size = size;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// The `shared_updates` object declared by the agent, if any.
    pub fn shared_updates(&self) -> Option<&serde_json::Map<String, Value>> {
        self.data.get("shared_updates").and_then(Value::as_object)
    }
}

/// Channel handler invoked once per dispatched request.
///
/// Implementations must resolve the request through
/// [`MessageBus::send_response`] exactly once and must not let errors escape.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, request: TaskRequest);
}

/// Minimal asynchronous request/response transport.
#[derive(Default)]
pub struct MessageBus {
    handlers: Mutex<HashMap<String, Arc<dyn TaskHandler>>>,
    pending: Mutex<HashMap<Uuid, oneshot::Sender<DelegationResult>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a handler with a channel. A later registration replaces the
    /// former without error.
    pub fn register_handler(&self, channel: impl Into<String>, handler: Arc<dyn TaskHandler>) {
        let channel = channel.into();
        let previous = self
            .handlers
            .lock()
            .expect("handler table poisoned")
            .insert(channel.clone(), handler);
        if previous.is_some() {
            debug!(channel = %channel, "replaced existing handler");
        }
    }

    pub fn has_handler(&self, channel: &str) -> bool {
        self.handlers
            .lock()
            .expect("handler table poisoned")
            .contains_key(channel)
    }

    pub fn registered_channels(&self) -> Vec<String> {
        self.handlers
            .lock()
            .expect("handler table poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("pending table poisoned").len()
    }

    /// Dispatch a request on `channel` and await its response.
    ///
    /// An unregistered channel is not a fast failure: the call waits out the
    /// full timeout, keeping the failure mode identical to a silent handler.
    pub async fn request_response(
        &self,
        channel: &str,
        mut request: TaskRequest,
        timeout: Duration,
    ) -> Result<DelegationResult> {
        let correlation_id = Uuid::new_v4();
        request.correlation_id = correlation_id;

        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending table poisoned")
            .insert(correlation_id, tx);

        let handler = self
            .handlers
            .lock()
            .expect("handler table poisoned")
            .get(channel)
            .cloned();

        match handler {
            Some(handler) => {
                debug!(channel = %channel, correlation_id = %correlation_id, "dispatching request");
                tokio::spawn(async move {
                    handler.handle(request).await;
                });
            }
            None => {
                debug!(
                    channel = %channel,
                    correlation_id = %correlation_id,
                    "no handler registered, request will wait out its timeout"
                );
            }
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => {
                // Sender dropped without responding; release the slot.
                self.pending
                    .lock()
                    .expect("pending table poisoned")
                    .remove(&correlation_id);
                Err(OrchestrationError::BusClosed {
                    channel: channel.to_string(),
                })
            }
            Err(_) => {
                self.pending
                    .lock()
                    .expect("pending table poisoned")
                    .remove(&correlation_id);
                warn!(
                    channel = %channel,
                    correlation_id = %correlation_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "request timed out"
                );
                Err(OrchestrationError::DispatchTimeout {
                    channel: channel.to_string(),
                    timeout,
                })
            }
        }
    }

    /// Resolve the pending slot for `correlation_id`.
    ///
    /// Unknown or expired ids are a no-op; the late response is dropped.
    pub fn send_response(&self, correlation_id: Uuid, result: DelegationResult) {
        let slot = self
            .pending
            .lock()
            .expect("pending table poisoned")
            .remove(&correlation_id);
        match slot {
            Some(tx) => {
                if tx.send(result).is_err() {
                    debug!(correlation_id = %correlation_id, "receiver gone, response dropped");
                }
            }
            None => {
                debug!(
                    correlation_id = %correlation_id,
                    "response for unknown or expired correlation id dropped"
                );
            }
        }
    }
}
