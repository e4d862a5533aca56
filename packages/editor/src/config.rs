use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_MAX_HISTORY;
use crate::rules::AffordanceRules;
use crate::EditorError;

/// Editor settings, read from the `livedit.config.json` format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Snapshots kept for undo
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Pause in free-text typing before a commit
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Delay after open before the initial snapshot
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Durable store key holding the committed state
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    #[serde(default)]
    pub rules: AffordanceRules,
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_settle_ms() -> u64 {
    500
}

fn default_storage_key() -> String {
    "livedit_content".to_string()
}

impl EditorConfig {
    /// Load config from a file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> Result<Self, EditorError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EditorError> {
        if self.max_history == 0 {
            return Err(EditorError::Config("maxHistory must be at least 1".to_string()));
        }
        if self.storage_key.trim().is_empty() {
            return Err(EditorError::Config("storageKey must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            debounce_ms: default_debounce_ms(),
            settle_ms: default_settle_ms(),
            storage_key: default_storage_key(),
            rules: AffordanceRules::default(),
        }
    }
}
