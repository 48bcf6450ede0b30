//! Subprocess-delegation fallback collaborator.
//!
//! When local orchestration is disabled or fails, tasks go through this path
//! instead. The default adapter shells out to the Claude CLI with a
//! role-scoped prompt and wraps its output into the same result envelope the
//! local path produces, so callers cannot tell the modes apart.

use crate::agents::{parse_agent_output, AgentType};
use crate::bus::DelegationResult;
use crate::error::{OrchestrationError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

#[async_trait]
pub trait SubprocessDelegate: Send + Sync {
    async fn delegate(&self, agent_type: &AgentType, task: &str) -> Result<DelegationResult>;
}

/// Spawns the Claude CLI per delegation, prompt on stdin.
pub struct ClaudeSubprocessDelegate {
    binary: String,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl ClaudeSubprocessDelegate {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            extra_args: vec!["-p".to_string()],
            timeout,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

#[async_trait]
impl SubprocessDelegate for ClaudeSubprocessDelegate {
    async fn delegate(&self, agent_type: &AgentType, task: &str) -> Result<DelegationResult> {
        info!(agent = %agent_type, "delegating via subprocess");

        let prompt = format!("{}\n\n**Task**: {}\n", agent_type.profile(), task);

        let mut child = Command::new(&self.binary)
            .args(&self.extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                OrchestrationError::Subprocess(format!("failed to spawn '{}': {}", self.binary, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(prompt.as_bytes()).await.map_err(|e| {
                OrchestrationError::Subprocess(format!("failed to write prompt: {e}"))
            })?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                OrchestrationError::Subprocess(format!(
                    "'{}' did not finish within {:?}",
                    self.binary, self.timeout
                ))
            })?
            .map_err(|e| {
                OrchestrationError::Subprocess(format!("failed to collect output: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OrchestrationError::Subprocess(format!(
                "'{}' exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(agent = %agent_type, output_len = raw.len(), "subprocess delegation finished");

        let data = parse_agent_output(&raw);
        Ok(DelegationResult::completed(agent_type.clone(), task, data))
    }
}
