//! Shared context, per-agent filtering, and delegation history.
//!
//! One `ContextManager` per orchestration session. The shared context is a
//! map of named sections; each agent role sees only the sections its filter
//! entry declares. The master history log is append-only; filtered views
//! truncate it to the most recent entries to bound prompt size.

use crate::agents::AgentType;
use crate::bus::{DelegationResult, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Default number of history entries included in a filtered context view.
pub const HISTORY_VIEW_LIMIT: usize = 3;

/// Shared-context section names used by the default filter table.
pub mod sections {
    pub const PROJECT_INFO: &str = "project_info";
    pub const CODE_FILES: &str = "code_files";
    pub const TEST_FILES: &str = "test_files";
    pub const CONFIG_FILES: &str = "config_files";
    pub const DOCS: &str = "docs";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const CURRENT_TASK: &str = "current_task";
}

/// One completed delegation, as remembered per agent role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub task: String,
    pub result: Value,
    pub status: TaskStatus,
    pub timestamp: DateTime<Utc>,
}

/// The filtered context view handed to an agent worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub agent_type: AgentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_task: Option<Value>,
    pub filtered_data: Map<String, Value>,
    #[serde(default)]
    pub recent_history: Vec<HistoryRecord>,
}

impl AgentContext {
    pub fn empty(agent_type: AgentType) -> Self {
        Self {
            agent_type,
            current_task: None,
            filtered_data: Map::new(),
            recent_history: Vec::new(),
        }
    }

    /// Serialized character length of this view.
    pub fn size(&self) -> usize {
        serde_json::to_string(self).map(|s| s.len()).unwrap_or(0)
    }
}

/// Summary of the current session, for observability passthroughs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSummary {
    pub sections: Vec<String>,
    pub history_counts: HashMap<String, usize>,
}

/// Holds the shared context blob and produces per-agent filtered views.
pub struct ContextManager {
    shared: HashMap<String, Value>,
    filters: HashMap<AgentType, Vec<String>>,
    history: HashMap<AgentType, Vec<HistoryRecord>>,
    history_view_limit: usize,
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextManager {
    pub fn new() -> Self {
        Self {
            shared: HashMap::new(),
            filters: default_filters(),
            history: HashMap::new(),
            history_view_limit: HISTORY_VIEW_LIMIT,
        }
    }

    /// Override how many recent history entries a filtered view carries.
    pub fn set_history_view_limit(&mut self, limit: usize) {
        self.history_view_limit = limit;
    }

    pub fn set_section(&mut self, name: impl Into<String>, value: Value) {
        self.shared.insert(name.into(), value);
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.shared.get(name)
    }

    pub fn set_current_task(&mut self, task: &str) {
        self.shared
            .insert(sections::CURRENT_TASK.to_string(), Value::String(task.to_string()));
    }

    /// Register or replace the filter entry for a role. Needed for custom
    /// roles, which otherwise see an empty filtered view.
    pub fn register_filter(&mut self, agent_type: AgentType, section_names: Vec<String>) {
        self.filters.insert(agent_type, section_names);
    }

    /// Build the filtered context view for one agent role.
    ///
    /// Deterministic for a given shared context and filter table; does not
    /// mutate shared state. A role without a filter entry gets an empty
    /// `filtered_data` rather than an error.
    pub fn get_agent_context(
        &self,
        agent_type: &AgentType,
        filter_override: Option<&[String]>,
    ) -> AgentContext {
        let sections: Vec<String> = match filter_override {
            Some(over) => over.to_vec(),
            None => self.filters.get(agent_type).cloned().unwrap_or_else(|| {
                debug!(agent = %agent_type, "no filter entry, producing empty view");
                Vec::new()
            }),
        };

        let mut filtered_data = Map::new();
        for name in &sections {
            if let Some(value) = self.shared.get(name) {
                filtered_data.insert(name.clone(), value.clone());
            }
        }

        let recent_history = self
            .history
            .get(agent_type)
            .map(|log| {
                log.iter()
                    .rev()
                    .take(self.history_view_limit)
                    .rev()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        AgentContext {
            agent_type: agent_type.clone(),
            current_task: self.shared.get(sections::CURRENT_TASK).cloned(),
            filtered_data,
            recent_history,
        }
    }

    /// Fold a delegation result back into session state: append to the role's
    /// history and shallow-merge any declared `shared_updates` (last write
    /// wins per key).
    pub fn update_context(&mut self, agent_type: &AgentType, result: &DelegationResult) {
        let record = HistoryRecord {
            task: result.task.clone(),
            result: result.data.clone(),
            status: result.status,
            timestamp: result.completed_at,
        };
        self.history
            .entry(agent_type.clone())
            .or_default()
            .push(record);

        if let Some(updates) = result.shared_updates() {
            for (key, value) in updates {
                self.shared.insert(key.clone(), value.clone());
            }
            debug!(
                agent = %agent_type,
                keys = updates.len(),
                "merged shared updates into session context"
            );
        }
    }

    /// Serialized length of the current filtered view for a role.
    /// Observability only.
    pub fn context_size(&self, agent_type: &AgentType) -> usize {
        self.get_agent_context(agent_type, None).size()
    }

    pub fn history(&self, agent_type: &AgentType) -> &[HistoryRecord] {
        self.history.get(agent_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn summary(&self) -> ContextSummary {
        let mut sections: Vec<String> = self.shared.keys().cloned().collect();
        sections.sort();
        let history_counts = self
            .history
            .iter()
            .map(|(agent, log)| (agent.to_string(), log.len()))
            .collect();
        ContextSummary {
            sections,
            history_counts,
        }
    }
}

/// Static filter table for the core agent roles.
fn default_filters() -> HashMap<AgentType, Vec<String>> {
    use sections::*;
    let table: &[(AgentType, &[&str])] = &[
        (AgentType::Documentation, &[PROJECT_INFO, DOCS, CURRENT_TASK]),
        (
            AgentType::Qa,
            &[PROJECT_INFO, TEST_FILES, CODE_FILES, CURRENT_TASK],
        ),
        (
            AgentType::Engineer,
            &[PROJECT_INFO, CODE_FILES, DEPENDENCIES, CURRENT_TASK],
        ),
        (
            AgentType::Research,
            &[PROJECT_INFO, DOCS, DEPENDENCIES, CURRENT_TASK],
        ),
        (
            AgentType::Ops,
            &[PROJECT_INFO, CONFIG_FILES, DEPENDENCIES, CURRENT_TASK],
        ),
        (
            AgentType::Security,
            &[PROJECT_INFO, CODE_FILES, CONFIG_FILES, DEPENDENCIES, CURRENT_TASK],
        ),
        (AgentType::VersionControl, &[PROJECT_INFO, CURRENT_TASK]),
        (AgentType::Ticketing, &[PROJECT_INFO, CURRENT_TASK]),
        (
            AgentType::DataEngineer,
            &[PROJECT_INFO, CODE_FILES, CONFIG_FILES, CURRENT_TASK],
        ),
    ];

    table
        .iter()
        .map(|(agent, names)| {
            (
                agent.clone(),
                names.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}
