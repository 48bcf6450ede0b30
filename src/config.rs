use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for Switchboard
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwitchboardConfig {
    /// Delegation and message bus settings
    pub orchestration: OrchestrationConfig,
    /// Claude CLI process settings
    pub agent_process: AgentProcessConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestrationConfig {
    /// Timeout for a single local delegation round-trip, in seconds
    pub delegation_timeout_seconds: u64,
    /// Number of recent history entries included in a filtered context view
    pub history_view_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentProcessConfig {
    /// Path to the Claude CLI binary used for LLM invocation and fallback
    pub claude_binary: String,
    /// Extra arguments passed before the prompt
    pub extra_args: Vec<String>,
    /// Timeout for fallback subprocess delegation, in seconds
    pub subprocess_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable structured tracing output
    pub tracing_enabled: bool,
    /// Log level
    pub log_level: String,
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            orchestration: OrchestrationConfig {
                delegation_timeout_seconds: 30,
                history_view_limit: 3,
            },
            agent_process: AgentProcessConfig {
                claude_binary: "claude".to_string(),
                extra_args: vec!["-p".to_string()],
                subprocess_timeout_seconds: 300,
            },
            observability: ObservabilityConfig {
                tracing_enabled: true,
                log_level: "info".to_string(),
            },
        }
    }
}

impl SwitchboardConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (switchboard.toml)
    /// 3. Environment variables (prefixed with SWITCHBOARD__)
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&SwitchboardConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new("switchboard.toml").exists() {
            builder = builder.add_source(File::with_name("switchboard"));
        }

        builder = builder.add_source(
            Environment::with_prefix("SWITCHBOARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn delegation_timeout(&self) -> Duration {
        Duration::from_secs(self.orchestration.delegation_timeout_seconds)
    }

    pub fn subprocess_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_process.subprocess_timeout_seconds)
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<SwitchboardConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = SwitchboardConfig::load_env_file();
        SwitchboardConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static SwitchboardConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
