use crate::history::DEFAULT_MAX_ENTRIES;
use crate::planner::DEFAULT_TEMP_NAME_ATTEMPTS;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the per-directory state directory
pub const STATE_DIR_NAME: &str = ".batchren";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// How many batches the undo history keeps
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Temporary names tried per cycle before the cycle is given up
    #[serde(default = "default_temp_name_attempts")]
    pub temp_name_attempts: usize,

    /// Write a per-batch log under .batchren/logs
    #[serde(default = "default_true")]
    pub write_log: bool,

    /// Default output format: "summary" or "json"
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            temp_name_attempts: default_temp_name_attempts(),
            write_log: true,
            output: default_output(),
        }
    }
}

fn default_max_history() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_temp_name_attempts() -> usize {
    DEFAULT_TEMP_NAME_ATTEMPTS
}

fn default_true() -> bool {
    true
}

fn default_output() -> String {
    "summary".to_string()
}

impl Config {
    /// Load config from `<dir>/.batchren/config.toml` if it exists
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(STATE_DIR_NAME).join("config.toml");
        if config_path.exists() {
            return Self::load_from_path(&config_path);
        }

        Ok(Self::default())
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
