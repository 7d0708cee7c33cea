//! Gateway configuration.
//!
//! Credentials and endpoint settings are loaded once at process start into an
//! explicit `GatewayConfig` and passed into the client constructor; nothing
//! here is ambient global state.
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults,
//! 2. an optional JSON config file named by `INSPECTION_CONFIG`,
//! 3. environment variables.
//!
//! Missing credentials load as empty strings without error: the gateway
//! rejects them and the failure surfaces through the degraded-result path.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::normalize::VISUALIZATION_FILE;

const DEFAULT_API_URL: &str = "https://serverless.roboflow.com";

#[derive(Debug, Deserialize, Default)]
struct GatewayConfigFile {
    api_url: Option<String>,
    api_key: Option<String>,
    workspace: Option<String>,
    workflow: Option<String>,
    visualization_path: Option<PathBuf>,
}

/// Resolved gateway settings for one process.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL of the workflow-inference gateway.
    pub api_url: String,
    /// API key, passed through unvalidated.
    pub api_key: String,
    /// Workspace identifier owning the workflow.
    pub workspace: String,
    /// Workflow identifier to execute.
    pub workflow: String,
    /// Where the decoded visualization image is saved after each inspection.
    pub visualization_path: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            workspace: String::new(),
            workflow: String::new(),
            visualization_path: PathBuf::from(VISUALIZATION_FILE),
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("INSPECTION_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env();
        Ok(cfg)
    }

    fn from_file(file: GatewayConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            api_url: file.api_url.unwrap_or(defaults.api_url),
            api_key: file.api_key.unwrap_or(defaults.api_key),
            workspace: file.workspace.unwrap_or(defaults.workspace),
            workflow: file.workflow.unwrap_or(defaults.workflow),
            visualization_path: file
                .visualization_path
                .unwrap_or(defaults.visualization_path),
        }
    }

    // API_KEY / WORKSPACE_NAME / WORKFLOW_ID keep the gateway's own variable
    // names so existing deployments carry over unchanged.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("INSPECTION_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(key) = std::env::var("API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = key;
            }
        }
        if let Ok(workspace) = std::env::var("WORKSPACE_NAME") {
            if !workspace.trim().is_empty() {
                self.workspace = workspace;
            }
        }
        if let Ok(workflow) = std::env::var("WORKFLOW_ID") {
            if !workflow.trim().is_empty() {
                self.workflow = workflow;
            }
        }
        if let Ok(path) = std::env::var("INSPECTION_VIS_PATH") {
            if !path.trim().is_empty() {
                self.visualization_path = PathBuf::from(path);
            }
        }
    }
}

fn read_config_file(path: &Path) -> Result<GatewayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
