//! Shared test doubles for the delegation stack.
//! The LLM and subprocess collaborators are trait seams, so tests script
//! their behavior instead of spawning real processes.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use switchboard::{
    AgentType, DelegationResult, LlmInvoke, OrchestrationError, SubprocessDelegate,
};

/// Returns scripted responses in order, repeating the last one when the
/// script runs out. Records every prompt it sees.
pub struct ScriptedInvoker {
    responses: Vec<String>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: responses.into_iter().map(String::from).collect(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn single(response: &str) -> Self {
        Self::new(vec![response])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmInvoke for ScriptedInvoker {
    async fn invoke(&self, prompt: &str) -> switchboard::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let idx = n.min(self.responses.len().saturating_sub(1));
        Ok(self.responses[idx].clone())
    }
}

/// Sleeps past any reasonable delegation timeout before answering.
pub struct SlowInvoker {
    pub delay: Duration,
}

#[async_trait]
impl LlmInvoke for SlowInvoker {
    async fn invoke(&self, _prompt: &str) -> switchboard::Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok("too late".to_string())
    }
}

/// Always fails, exercising the worker's failed-result envelope.
pub struct FailingInvoker;

#[async_trait]
impl LlmInvoke for FailingInvoker {
    async fn invoke(&self, _prompt: &str) -> switchboard::Result<String> {
        Err(OrchestrationError::Llm("model unavailable".to_string()))
    }
}

/// Deterministic fallback collaborator; marks its results so tests can tell
/// which path served them.
pub struct StubDelegate {
    pub calls: AtomicUsize,
}

impl StubDelegate {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubprocessDelegate for StubDelegate {
    async fn delegate(
        &self,
        agent_type: &AgentType,
        task: &str,
    ) -> switchboard::Result<DelegationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = serde_json::json!({
            "result": format!("fallback handled: {task}"),
            "shared_updates": {},
            "next_actions": [],
            "recommendations": []
        });
        Ok(DelegationResult::completed(agent_type.clone(), task, data))
    }
}

/// Fallback collaborator whose failures must propagate to the caller.
pub struct FailingDelegate;

#[async_trait]
impl SubprocessDelegate for FailingDelegate {
    async fn delegate(
        &self,
        _agent_type: &AgentType,
        _task: &str,
    ) -> switchboard::Result<DelegationResult> {
        Err(OrchestrationError::Subprocess(
            "fallback binary missing".to_string(),
        ))
    }
}
