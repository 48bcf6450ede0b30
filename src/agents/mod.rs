// Agent roles and workers for local delegation
// Workers are registered as message bus handlers; the LLM call sits behind a
// trait seam so tests inject deterministic doubles.

pub mod llm;
pub mod role;
pub mod worker;

pub use llm::{ClaudeCliInvoker, LlmInvoke};
pub use role::AgentType;
pub use worker::{parse_agent_output, AgentWorker};
