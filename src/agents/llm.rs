//! LLM invocation seam.
//!
//! Workers call the model through `LlmInvoke` so the external collaborator
//! can be a Claude CLI subprocess in production and a deterministic double in
//! tests.

use crate::error::{OrchestrationError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[async_trait]
pub trait LlmInvoke: Send + Sync {
    /// Send a role-scoped prompt and return the generated text.
    async fn invoke(&self, prompt: &str) -> Result<String>;
}

/// Invokes the Claude CLI as a child process, passing the prompt on stdin.
pub struct ClaudeCliInvoker {
    binary: String,
    extra_args: Vec<String>,
}

impl ClaudeCliInvoker {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: vec!["-p".to_string()],
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

#[async_trait]
impl LlmInvoke for ClaudeCliInvoker {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        debug!(binary = %self.binary, prompt_len = prompt.len(), "invoking LLM subprocess");

        let mut child = Command::new(&self.binary)
            .args(&self.extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                OrchestrationError::Llm(format!("failed to spawn '{}': {}", self.binary, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| OrchestrationError::Llm(format!("failed to write prompt: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OrchestrationError::Llm(format!("failed to collect output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OrchestrationError::Llm(format!(
                "'{}' exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
