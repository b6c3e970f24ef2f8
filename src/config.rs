//! Configuration Management
//!
//! Handles persistent configuration storage for wbk.

use crate::workbooks::Scope;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the workflow endpoint
pub const ENDPOINT_ENV_VAR: &str = "OS_WORKFLOW_ENDPOINT";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Workflow API endpoint, e.g. `http://controller:8989/v2`
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Namespace used when none is given on the command line
    #[serde(default)]
    pub namespace: Option<String>,
    /// Scope used for new workbooks
    #[serde(default)]
    pub scope: Option<Scope>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("wbk").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path; a missing or unreadable file gives defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective endpoint (CLI > config > environment)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.endpoint.clone())
            .or_else(|| std::env::var(ENDPOINT_ENV_VAR).ok())
            .filter(|endpoint| !endpoint.trim().is_empty())
    }

    /// Get effective namespace (CLI > config)
    pub fn effective_namespace(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.namespace.clone())
    }

    /// Get effective scope (CLI > config)
    pub fn effective_scope(&self, cli: Option<Scope>) -> Option<Scope> {
        cli.or(self.scope)
    }
}
