//! Backwards-compatible delegation entry point.
//!
//! External callers use `Delegator::delegate_to_agent` and never see which
//! path served them. The orchestration mode is resolved once per facade from
//! the project's configuration file; any failure on the local path is logged
//! and transparently retried through the subprocess collaborator. Only a
//! fallback-path failure reaches the caller, since no further fallback
//! exists.

use crate::agents::{AgentType, ClaudeCliInvoker, LlmInvoke};
use crate::bus::DelegationResult;
use crate::config::SwitchboardConfig;
use crate::context::ContextSummary;
use crate::detector::{OrchestrationDetector, OrchestrationMode};
use crate::error::Result;
use crate::fallback::{ClaudeSubprocessDelegate, SubprocessDelegate};
use crate::orchestrator::{AgentStatus, Orchestrator};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Aggregate delegation metrics for one facade instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrchestrationMetrics {
    pub total_delegations: u64,
    pub local_delegations: u64,
    pub subprocess_delegations: u64,
    /// Local attempts that were served by the subprocess path instead.
    pub fallback_delegations: u64,
    pub average_execution_ms: f64,
}

enum DelegationPath {
    Local,
    Subprocess,
    Fallback,
}

#[derive(Default)]
struct MetricsState {
    total: u64,
    local: u64,
    subprocess: u64,
    fallback: u64,
    total_execution: Duration,
}

pub struct Delegator {
    orchestrator: Orchestrator,
    fallback: Arc<dyn SubprocessDelegate>,
    detector: OrchestrationDetector,
    mode: OnceCell<OrchestrationMode>,
    metrics: StdMutex<MetricsState>,
}

impl Delegator {
    pub fn new(
        project_root: impl AsRef<Path>,
        invoker: Arc<dyn LlmInvoke>,
        fallback: Arc<dyn SubprocessDelegate>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(invoker),
            fallback,
            detector: OrchestrationDetector::new(project_root.as_ref()),
            mode: OnceCell::new(),
            metrics: StdMutex::new(MetricsState::default()),
        }
    }

    /// Wire up the Claude CLI for both the local LLM calls and the
    /// subprocess fallback, per configuration.
    pub fn from_config(project_root: impl AsRef<Path>, config: &SwitchboardConfig) -> Self {
        let invoker = Arc::new(
            ClaudeCliInvoker::new(&config.agent_process.claude_binary)
                .with_args(config.agent_process.extra_args.clone()),
        );
        let fallback = Arc::new(
            ClaudeSubprocessDelegate::new(
                &config.agent_process.claude_binary,
                config.subprocess_timeout(),
            )
            .with_args(config.agent_process.extra_args.clone()),
        );
        let mut delegator = Self::new(project_root, invoker, fallback);
        delegator.orchestrator = delegator
            .orchestrator
            .with_timeout(config.delegation_timeout())
            .with_history_view_limit(config.orchestration.history_view_limit);
        delegator
    }

    pub fn with_delegation_timeout(mut self, timeout: Duration) -> Self {
        self.orchestrator = self.orchestrator.with_timeout(timeout);
        self
    }

    /// Pin the orchestration mode, bypassing detection. For tests and
    /// explicit overrides.
    pub fn with_mode(self, mode: OrchestrationMode) -> Self {
        Self {
            mode: OnceCell::new_with(Some(mode)),
            ..self
        }
    }

    /// The resolved orchestration mode, detected once per facade lifetime.
    pub async fn mode(&self) -> OrchestrationMode {
        *self
            .mode
            .get_or_init(|| async {
                let mode = self.detector.detect_mode();
                info!(mode = mode.as_str(), "orchestration mode resolved");
                mode
            })
            .await
    }

    /// Free-form orchestration instructions from the project configuration.
    pub fn orchestration_instructions(&self) -> Option<String> {
        self.detector.extract_instructions()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Delegate a task to an agent role.
    ///
    /// Never errors for orchestration-internal failures: a failing local
    /// delegation is retried through the subprocess path and that result is
    /// returned instead.
    pub async fn delegate_to_agent(
        &self,
        agent_type: &AgentType,
        task: &str,
    ) -> Result<DelegationResult> {
        let started = Instant::now();
        match self.mode().await {
            OrchestrationMode::Local => {
                match self
                    .orchestrator
                    .delegate_to_agent(agent_type, task, None)
                    .await
                {
                    Ok(result) => {
                        self.record_delegation(DelegationPath::Local, started.elapsed());
                        Ok(result)
                    }
                    Err(e) => {
                        warn!(
                            agent = %agent_type,
                            error = %e,
                            "local delegation failed, retrying via subprocess fallback"
                        );
                        let result = self.fallback.delegate(agent_type, task).await;
                        self.record_delegation(DelegationPath::Fallback, started.elapsed());
                        result
                    }
                }
            }
            OrchestrationMode::Subprocess => {
                let result = self.fallback.delegate(agent_type, task).await;
                self.record_delegation(DelegationPath::Subprocess, started.elapsed());
                result
            }
        }
    }

    fn record_delegation(&self, path: DelegationPath, elapsed: Duration) {
        let mut state = self.metrics.lock().expect("metrics state poisoned");
        state.total += 1;
        state.total_execution += elapsed;
        match path {
            DelegationPath::Local => state.local += 1,
            DelegationPath::Subprocess => state.subprocess += 1,
            DelegationPath::Fallback => state.fallback += 1,
        }
    }

    /// Delegation counts per path and average execution time for this facade.
    pub fn metrics(&self) -> OrchestrationMetrics {
        let state = self.metrics.lock().expect("metrics state poisoned");
        let average_execution_ms = if state.total == 0 {
            0.0
        } else {
            state.total_execution.as_secs_f64() * 1000.0 / state.total as f64
        };
        OrchestrationMetrics {
            total_delegations: state.total,
            local_delegations: state.local,
            subprocess_delegations: state.subprocess,
            fallback_delegations: state.fallback,
            average_execution_ms,
        }
    }

    /// Observability passthrough; no effect on orchestration state.
    pub async fn get_agent_status(&self, agent_type: &AgentType) -> AgentStatus {
        self.orchestrator.agent_status(agent_type).await
    }

    pub async fn context_summary(&self) -> ContextSummary {
        self.orchestrator.context_summary().await
    }

    /// Log the current session summary at info level.
    pub async fn print_context_summary(&self) {
        let summary = self.orchestrator.context_summary().await;
        info!(
            sections = ?summary.sections,
            history = ?summary.history_counts,
            "session context summary"
        );
    }
}
