//! Orchestration mode detection from project-local `CLAUDE.md` files.
//!
//! Local orchestration is opt-in: a project enables it by carrying the
//! `CLAUDE_PM_ORCHESTRATION` marker with an `ENABLED` qualifier in the nearest
//! `CLAUDE.md`. Anything else, including a missing or unreadable file, falls
//! back to subprocess delegation. Detection is read-only and never errors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "CLAUDE.md";
const ORCHESTRATION_MARKER: &str = "CLAUDE_PM_ORCHESTRATION";
const ENABLED_QUALIFIER: &str = "ENABLED";

/// How many parent directories are searched above the start path.
const MAX_PARENT_LEVELS: usize = 3;

/// Orchestration mode resolved once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationMode {
    /// In-process delegation through the message bus.
    Local,
    /// Delegation through the external subprocess collaborator.
    Subprocess,
}

impl OrchestrationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Subprocess => "subprocess",
        }
    }
}

/// Detects whether local orchestration is enabled for a project.
#[derive(Debug, Clone)]
pub struct OrchestrationDetector {
    start_path: PathBuf,
}

impl OrchestrationDetector {
    pub fn new(start_path: impl Into<PathBuf>) -> Self {
        Self {
            start_path: start_path.into(),
        }
    }

    /// Detector rooted at the current working directory.
    pub fn current_dir() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn start_path(&self) -> &Path {
        &self.start_path
    }

    /// Resolve the orchestration mode for this project.
    ///
    /// Returns `Local` only when the nearest `CLAUDE.md` carries the
    /// enablement marker with its `ENABLED` qualifier on the same or an
    /// adjacent line. Read errors resolve to `Subprocess`.
    pub fn detect_mode(&self) -> OrchestrationMode {
        match self.nearest_config() {
            Some((path, text)) if marker_enabled(&text) => {
                info!(path = %path.display(), "local orchestration enabled");
                OrchestrationMode::Local
            }
            Some((path, _)) => {
                debug!(
                    path = %path.display(),
                    "configuration present without enablement marker, using subprocess delegation"
                );
                OrchestrationMode::Subprocess
            }
            None => {
                debug!(
                    start_path = %self.start_path.display(),
                    "no readable configuration found, using subprocess delegation"
                );
                OrchestrationMode::Subprocess
            }
        }
    }

    /// Path to the `CLAUDE.md` that enabled local orchestration, if any.
    pub fn claude_md_path(&self) -> Option<PathBuf> {
        self.nearest_config()
            .filter(|(_, text)| marker_enabled(text))
            .map(|(path, _)| path)
    }

    /// Free-form orchestration instructions following the enablement marker,
    /// up to the next markdown heading.
    pub fn extract_instructions(&self) -> Option<String> {
        let (_, text) = self.nearest_config()?;
        let lines: Vec<&str> = text.lines().collect();
        let marker_idx = lines.iter().position(|l| l.contains(ORCHESTRATION_MARKER))?;

        let mut section = Vec::new();
        for line in &lines[marker_idx + 1..] {
            if line.trim_start().starts_with('#') {
                break;
            }
            section.push(*line);
        }

        let instructions = section.join("\n").trim().to_string();
        if instructions.is_empty() {
            None
        } else {
            Some(instructions)
        }
    }

    /// The nearest readable `CLAUDE.md` decides; farther files are ignored
    /// even if the nearest one lacks the marker.
    fn nearest_config(&self) -> Option<(PathBuf, String)> {
        for dir in self.candidate_dirs() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if !candidate.is_file() {
                continue;
            }
            return match std::fs::read_to_string(&candidate) {
                Ok(text) => Some((candidate, text)),
                Err(e) => {
                    debug!(path = %candidate.display(), error = %e, "configuration unreadable");
                    None
                }
            };
        }
        None
    }

    fn candidate_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.start_path.clone()];
        let mut current = self.start_path.as_path();
        for _ in 0..MAX_PARENT_LEVELS {
            match current.parent() {
                Some(parent) => {
                    dirs.push(parent.to_path_buf());
                    current = parent;
                }
                None => break,
            }
        }
        dirs
    }
}

/// Marker match is case-sensitive; the qualifier may sit on the marker line
/// or on either adjacent line.
fn marker_enabled(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !line.contains(ORCHESTRATION_MARKER) {
            continue;
        }
        if line.contains(ENABLED_QUALIFIER) {
            return true;
        }
        if i > 0 && lines[i - 1].contains(ENABLED_QUALIFIER) {
            return true;
        }
        if lines.get(i + 1).is_some_and(|l| l.contains(ENABLED_QUALIFIER)) {
            return true;
        }
    }
    false
}
