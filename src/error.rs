use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the orchestration core.
///
/// Detection failures never appear here: an unreadable configuration file
/// resolves to subprocess mode instead of an error. Worker-side LLM or parse
/// failures are reported as `Failed` delegation results, not errors.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("request on channel '{channel}' timed out after {timeout:?}")]
    DispatchTimeout { channel: String, timeout: Duration },

    #[error("response channel for '{channel}' closed before a reply arrived")]
    BusClosed { channel: String },

    #[error("LLM invocation failed: {0}")]
    Llm(String),

    #[error("subprocess delegation failed: {0}")]
    Subprocess(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OrchestrationError>;
