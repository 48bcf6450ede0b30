//! Agent role taxonomy.
//!
//! Known core roles are closed enum variants so the filter table and channel
//! naming are typo-proof; `Custom` keeps the door open for project-defined
//! roles, which fail safe to an empty context filter.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentType {
    Documentation,
    Qa,
    Engineer,
    Research,
    Ops,
    Security,
    VersionControl,
    Ticketing,
    DataEngineer,
    Custom(String),
}

impl AgentType {
    pub fn name(&self) -> &str {
        match self {
            Self::Documentation => "documentation",
            Self::Qa => "qa",
            Self::Engineer => "engineer",
            Self::Research => "research",
            Self::Ops => "ops",
            Self::Security => "security",
            Self::VersionControl => "version_control",
            Self::Ticketing => "ticketing",
            Self::DataEngineer => "data_engineer",
            Self::Custom(name) => name,
        }
    }

    /// Bus channel name for this role's worker.
    pub fn channel(&self) -> String {
        format!("agent_{}", self.name())
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "documentation" => Self::Documentation,
            "qa" => Self::Qa,
            "engineer" => Self::Engineer,
            "research" => Self::Research,
            "ops" => Self::Ops,
            "security" => Self::Security,
            "version_control" => Self::VersionControl,
            "ticketing" => Self::Ticketing,
            "data_engineer" => Self::DataEngineer,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Role capability description used when building prompts.
    pub fn profile(&self) -> String {
        match self {
            Self::Documentation => {
                "You are the Documentation Agent, responsible for creating and maintaining \
                 project documentation. You ensure clear, comprehensive documentation across \
                 all project aspects."
                    .to_string()
            }
            Self::Qa => {
                "You are the QA Agent, responsible for quality assurance, testing, and \
                 validation. You ensure project quality through comprehensive testing \
                 strategies."
                    .to_string()
            }
            Self::Engineer => {
                "You are the Engineer Agent, responsible for code implementation, development, \
                 and technical problem solving. You provide software engineering expertise and \
                 best practices."
                    .to_string()
            }
            Self::Research => {
                "You are the Research Agent, responsible for investigation, analysis, and \
                 information gathering. You provide in-depth research and technical analysis."
                    .to_string()
            }
            Self::Ops => {
                "You are the Ops Agent, responsible for deployment, operations, and \
                 infrastructure. You handle all operational aspects of project deployment and \
                 maintenance."
                    .to_string()
            }
            Self::Security => {
                "You are the Security Agent, responsible for security analysis, vulnerability \
                 assessment, and protection. You protect projects from vulnerabilities and \
                 threats."
                    .to_string()
            }
            Self::VersionControl => {
                "You are the Version Control Agent, responsible for Git operations and version \
                 management. You manage branches, merges, and repository workflows."
                    .to_string()
            }
            Self::Ticketing => {
                "You are the Ticketing Agent, responsible for ticket lifecycle and issue \
                 tracking. You provide a universal ticketing interface across platforms."
                    .to_string()
            }
            Self::DataEngineer => {
                "You are the Data Engineer Agent, responsible for data management and AI API \
                 integrations. You handle databases, data pipelines, and data architecture."
                    .to_string()
            }
            Self::Custom(name) => format!(
                "You are the {name} Agent. Your role is to assist with {name} tasks and \
                 provide expert guidance."
            ),
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for AgentType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<AgentType> for String {
    fn from(value: AgentType) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_known_roles() {
        for role in [
            AgentType::Documentation,
            AgentType::Qa,
            AgentType::Engineer,
            AgentType::VersionControl,
            AgentType::DataEngineer,
        ] {
            assert_eq!(AgentType::parse(role.name()), role);
        }
    }

    #[test]
    fn unknown_names_become_custom() {
        let parsed = AgentType::parse("reviewer");
        assert_eq!(parsed, AgentType::Custom("reviewer".to_string()));
        assert_eq!(parsed.channel(), "agent_reviewer");
    }

    #[test]
    fn channel_names_are_deterministic() {
        assert_eq!(AgentType::Qa.channel(), "agent_qa");
        assert_eq!(AgentType::VersionControl.channel(), "agent_version_control");
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&AgentType::DataEngineer).unwrap();
        assert_eq!(json, "\"data_engineer\"");
        let back: AgentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AgentType::DataEngineer);
    }
}
