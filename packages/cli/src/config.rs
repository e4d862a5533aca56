use anyhow::Context;
use livedit_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "livedit.config.json";

/// Livedit project configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Template document loaded when nothing has been saved yet
    #[serde(default = "default_document")]
    pub document: String,

    /// Directory holding the committed state
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Engine settings live at the top level of the same file
    #[serde(flatten)]
    pub editor: EditorConfig,
}

fn default_document() -> String {
    "document.json".to_string()
}

fn default_store_dir() -> String {
    ".livedit".to_string()
}

impl CliConfig {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: CliConfig = serde_json::from_str(&content)
                .with_context(|| format!("invalid {}", config_path.display()))?;
            config.editor.validate()?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(CliConfig::default())
        }
    }

    pub fn document_path(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.document)
    }

    pub fn store_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.store_dir)
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            document: default_document(),
            store_dir: default_store_dir(),
            editor: EditorConfig::default(),
        }
    }
}
