// Switchboard - local agent orchestration with transparent subprocess fallback
// This exposes the core components for testing and integration

pub mod agents;
pub mod bus;
pub mod config;
pub mod context;
pub mod detector;
pub mod error;
pub mod facade;
pub mod fallback;
pub mod memory;
pub mod orchestrator;
pub mod telemetry;

// Re-export key types for easy access
pub use agents::{parse_agent_output, AgentType, AgentWorker, ClaudeCliInvoker, LlmInvoke};
pub use bus::{DelegationResult, MessageBus, TaskHandler, TaskRequest, TaskStatus};
pub use config::{config, init_config, ObservabilityConfig, SwitchboardConfig};
pub use context::{AgentContext, ContextManager, ContextSummary, HistoryRecord};
pub use detector::{OrchestrationDetector, OrchestrationMode};
pub use error::{OrchestrationError, Result};
pub use facade::{Delegator, OrchestrationMetrics};
pub use fallback::{ClaudeSubprocessDelegate, SubprocessDelegate};
pub use memory::{InMemoryStore, MemoryHit, MemoryMessage, MemoryStore};
pub use orchestrator::{AgentStatus, Orchestrator};
pub use telemetry::{
    create_delegation_span, generate_correlation_id, init_telemetry, shutdown_telemetry,
};
