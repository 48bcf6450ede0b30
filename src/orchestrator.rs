//! Local delegation coordinator.
//!
//! For each delegation the orchestrator ensures the target role's worker is
//! registered, fetches that role's filtered context, routes the task through
//! the message bus, and folds the result back into session state. Shared
//! context is mutated only here (single-writer rule); delegations to the same
//! role are serialized by a per-role async mutex so history updates never
//! interleave.

use crate::agents::{AgentType, AgentWorker, LlmInvoke};
use crate::bus::{DelegationResult, MessageBus, TaskRequest};
use crate::context::{AgentContext, ContextManager, ContextSummary};
use crate::error::Result;
use crate::memory::MemoryStore;
use crate::telemetry::{create_delegation_span, generate_correlation_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, Instrument};

const DEFAULT_DELEGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-role delegation summary, derived from history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_type: AgentType,
    pub worker_registered: bool,
    pub total_tasks: usize,
    pub completed: usize,
    pub failed: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

pub struct Orchestrator {
    bus: Arc<MessageBus>,
    context: Mutex<ContextManager>,
    invoker: Arc<dyn LlmInvoke>,
    memory: Option<Arc<dyn MemoryStore>>,
    delegation_timeout: Duration,
    // Per-role locks serialize same-role delegations.
    role_locks: StdMutex<HashMap<AgentType, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(invoker: Arc<dyn LlmInvoke>) -> Self {
        Self {
            bus: Arc::new(MessageBus::new()),
            context: Mutex::new(ContextManager::new()),
            invoker,
            memory: None,
            delegation_timeout: DEFAULT_DELEGATION_TIMEOUT,
            role_locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.delegation_timeout = timeout;
        self
    }

    /// Override how many recent history entries each filtered view carries.
    pub fn with_history_view_limit(mut self, limit: usize) -> Self {
        self.context.get_mut().set_history_view_limit(limit);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn bus(&self) -> Arc<MessageBus> {
        self.bus.clone()
    }

    /// Seed or replace a shared-context section for this session.
    pub async fn set_section(&self, name: &str, value: serde_json::Value) {
        self.context.lock().await.set_section(name, value);
    }

    /// Register a filter entry for a custom role.
    pub async fn register_filter(&self, agent_type: AgentType, section_names: Vec<String>) {
        self.context
            .lock()
            .await
            .register_filter(agent_type, section_names);
    }

    /// Delegate one task to an agent role over the local path.
    ///
    /// Timeouts and bus errors propagate to the caller; the facade treats
    /// them as a trigger for subprocess fallback. A worker-side failure is
    /// not an error: it comes back as a `Failed` result and still lands in
    /// that role's history.
    pub async fn delegate_to_agent(
        &self,
        agent_type: &AgentType,
        task: &str,
        filter_override: Option<&[String]>,
    ) -> Result<DelegationResult> {
        let correlation_id = generate_correlation_id();
        let span = create_delegation_span(
            "delegate_to_agent",
            Some(agent_type.name()),
            Some(&correlation_id),
        );

        async {
            let role_lock = self.role_lock(agent_type);
            let _serialized = role_lock.lock().await;

            self.ensure_worker(agent_type);

            let context = {
                let mut manager = self.context.lock().await;
                manager.set_current_task(task);
                manager.get_agent_context(agent_type, filter_override)
            };
            let context_size = context.size();

            info!(
                agent = %agent_type,
                context_size = context_size,
                "dispatching task to local worker"
            );

            let request = TaskRequest::new(agent_type.clone(), task, context);
            let result = self
                .bus
                .request_response(&agent_type.channel(), request, self.delegation_timeout)
                .await?;

            self.context.lock().await.update_context(agent_type, &result);

            info!(
                agent = %agent_type,
                status = ?result.status,
                "delegation complete"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Current filtered view for a role, without dispatching anything.
    pub async fn agent_context(
        &self,
        agent_type: &AgentType,
        filter_override: Option<&[String]>,
    ) -> AgentContext {
        self.context
            .lock()
            .await
            .get_agent_context(agent_type, filter_override)
    }

    pub async fn context_size(&self, agent_type: &AgentType) -> usize {
        self.context.lock().await.context_size(agent_type)
    }

    pub async fn agent_status(&self, agent_type: &AgentType) -> AgentStatus {
        let manager = self.context.lock().await;
        let log = manager.history(agent_type);
        let completed = log.iter().filter(|r| r.status.is_completed()).count();
        AgentStatus {
            agent_type: agent_type.clone(),
            worker_registered: self.bus.has_handler(&agent_type.channel()),
            total_tasks: log.len(),
            completed,
            failed: log.len() - completed,
            last_activity: log.last().map(|r| r.timestamp),
        }
    }

    pub async fn context_summary(&self) -> ContextSummary {
        self.context.lock().await.summary()
    }

    fn ensure_worker(&self, agent_type: &AgentType) {
        let channel = agent_type.channel();
        if self.bus.has_handler(&channel) {
            return;
        }
        let mut worker =
            AgentWorker::new(agent_type.clone(), self.bus.clone(), self.invoker.clone());
        if let Some(memory) = &self.memory {
            worker = worker.with_memory(memory.clone());
        }
        self.bus.register_handler(channel.clone(), Arc::new(worker));
        info!(agent = %agent_type, channel = %channel, "registered agent worker");
    }

    fn role_lock(&self, agent_type: &AgentType) -> Arc<Mutex<()>> {
        self.role_locks
            .lock()
            .expect("role lock table poisoned")
            .entry(agent_type.clone())
            .or_default()
            .clone()
    }
}
