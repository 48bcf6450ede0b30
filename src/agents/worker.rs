//! Agent worker: one role, one bus channel.
//!
//! A worker turns a filtered context into a role-scoped prompt, invokes the
//! LLM, and answers through the bus exactly once per request. Failures become
//! `Failed` result envelopes rather than escaping into the bus's scheduling
//! layer.

use crate::agents::llm::LlmInvoke;
use crate::agents::role::AgentType;
use crate::bus::{DelegationResult, MessageBus, TaskHandler, TaskRequest};
use crate::error::Result;
use crate::memory::{MemoryMessage, MemoryStore};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AgentWorker {
    agent_type: AgentType,
    profile: String,
    bus: Arc<MessageBus>,
    invoker: Arc<dyn LlmInvoke>,
    memory: Option<Arc<dyn MemoryStore>>,
}

impl AgentWorker {
    pub fn new(agent_type: AgentType, bus: Arc<MessageBus>, invoker: Arc<dyn LlmInvoke>) -> Self {
        let profile = agent_type.profile();
        Self {
            agent_type,
            profile,
            bus,
            invoker,
            memory: None,
        }
    }

    /// Attach the optional memory collaborator; completed tasks are recorded
    /// there for later retrieval.
    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    async fn execute(&self, request: &TaskRequest) -> Result<DelegationResult> {
        let prompt = self.build_prompt(request);
        let raw = self.invoker.invoke(&prompt).await?;
        let data = parse_agent_output(&raw);

        if let Some(memory) = &self.memory {
            let messages = [
                MemoryMessage::new("user", &request.task),
                MemoryMessage::new("assistant", &raw),
            ];
            let metadata = json!({ "agent_type": self.agent_type.name() });
            if let Err(e) = memory.add(&messages, self.agent_type.name(), metadata).await {
                debug!(agent = %self.agent_type, error = %e, "memory add failed, continuing");
            }
        }

        Ok(
            DelegationResult::completed(self.agent_type.clone(), request.task.clone(), data)
                .with_context_size(request.context.size()),
        )
    }

    fn build_prompt(&self, request: &TaskRequest) -> String {
        let context_json = serde_json::to_string_pretty(&request.context.filtered_data)
            .unwrap_or_else(|_| "{}".to_string());

        let mut prompt = format!(
            "{profile}\n\n**Task**: {task}\n\n**Context**:\n{context}\n",
            profile = self.profile,
            task = request.task,
            context = context_json,
        );

        if !request.context.recent_history.is_empty() {
            prompt.push_str("\n**Recent tasks for this role**:\n");
            for record in &request.context.recent_history {
                prompt.push_str(&format!("- [{:?}] {}\n", record.status, record.task));
            }
        }

        prompt.push_str(
            "\nRespond with JSON: {\"result\": ..., \"shared_updates\": {...}, \
             \"next_actions\": [...], \"recommendations\": [...]}\n",
        );
        prompt
    }
}

#[async_trait]
impl TaskHandler for AgentWorker {
    async fn handle(&self, request: TaskRequest) {
        let correlation_id = request.correlation_id;
        let result = match self.execute(&request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    agent = %self.agent_type,
                    correlation_id = %correlation_id,
                    error = %e,
                    "task execution failed"
                );
                DelegationResult::failed(self.agent_type.clone(), request.task.clone(), e.to_string())
            }
        };
        self.bus.send_response(correlation_id, result);
    }
}

/// Parse LLM output into the result payload.
///
/// Valid JSON objects are kept, with the recognized keys filled in when
/// missing; anything else degrades into a minimal envelope wrapping the raw
/// text. Parsing never fails a task.
pub fn parse_agent_output(raw: &str) -> Value {
    let mut map = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        }
        Err(_) => {
            let mut map = Map::new();
            map.insert("result".to_string(), Value::String(raw.to_string()));
            map
        }
    };

    map.entry("shared_updates").or_insert_with(|| json!({}));
    map.entry("next_actions").or_insert_with(|| json!([]));
    map.entry("recommendations").or_insert_with(|| json!([]));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_output_degrades_to_minimal_envelope() {
        let data = parse_agent_output("Done.");
        assert_eq!(
            data,
            json!({
                "result": "Done.",
                "shared_updates": {},
                "next_actions": [],
                "recommendations": []
            })
        );
    }

    #[test]
    fn json_object_output_is_kept_and_backfilled() {
        let data = parse_agent_output(r#"{"result": "ok", "shared_updates": {"docs": []}}"#);
        assert_eq!(data["result"], "ok");
        assert_eq!(data["shared_updates"], json!({"docs": []}));
        assert_eq!(data["next_actions"], json!([]));
        assert_eq!(data["recommendations"], json!([]));
    }

    #[test]
    fn json_scalar_output_is_wrapped() {
        let data = parse_agent_output("42");
        assert_eq!(data["result"], json!(42));
        assert_eq!(data["shared_updates"], json!({}));
    }
}
