//! Agent configuration stored in `steploop.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::core::types::DenialPolicy;

/// Default config file name, looked up in the process directory.
pub const DEFAULT_CONFIG_FILE: &str = "steploop.toml";

/// Agent configuration (TOML).
///
/// Missing fields fall back to defaults, so an absent file is a valid config.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Gemini model id.
    pub model: String,

    /// Base URL of the Generative Language API.
    pub api_base_url: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// What a `n` answer at the confirmation prompt does.
    pub denial_policy: DenialPolicy,

    /// Message sent to request the next step after a plan or observe step.
    pub continuation_message: String,

    /// Cap on model calls within one user query. Unset means unlimited.
    pub max_steps_per_turn: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_KEY".to_string(),
            denial_policy: DenialPolicy::Terminate,
            continuation_message: "continue".to_string(),
            max_steps_per_turn: None,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(anyhow!("api_base_url must be non-empty"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(anyhow!("api_key_env must be non-empty"));
        }
        if self.max_steps_per_turn == Some(0) {
            return Err(anyhow!("max_steps_per_turn must be > 0 when set"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if !path.exists() {
        let cfg = AgentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AgentConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
