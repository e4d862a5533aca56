use crate::config::{CliConfig, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

const SAMPLE_DOCUMENT: &str = include_str!("../../assets/sample_document.json");

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Template document to create
    #[arg(short, long, default_value = "document.json")]
    pub document: String,

    /// Directory for the committed state
    #[arg(short, long, default_value = ".livedit")]
    pub store_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing livedit project...".bright_blue().bold());

    let document_path = PathBuf::from(cwd).join(&args.document);
    if !document_path.exists() {
        if let Some(parent) = document_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&document_path, SAMPLE_DOCUMENT)?;
        println!("  {} Created {}", "✓".green(), args.document);
    }

    let config = CliConfig {
        document: args.document.clone(),
        store_dir: args.store_dir.clone(),
        ..CliConfig::default()
    };

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: livedit edit");
    println!("  2. Type `toggle` to enter edit mode, `help` for commands");
    println!("  3. Run: livedit show");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use livedit_editor::Document;

    fn args(force: bool) -> InitArgs {
        InitArgs {
            document: "document.json".to_string(),
            store_dir: ".livedit".to_string(),
            force,
        }
    }

    #[test]
    fn test_sample_document_parses() {
        let doc = Document::from_json(SAMPLE_DOCUMENT).unwrap();
        assert!(doc.find_by_id("skills-container").is_some());
    }

    #[test]
    fn test_init_writes_config_and_document() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        init(args(false), &cwd).unwrap();

        let config = CliConfig::load(&cwd).unwrap();
        assert_eq!(config.store_dir, ".livedit");
        assert!(config.document_path(&cwd).exists());
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "document": "mine.json" }"#).unwrap();

        init(args(false), &cwd).unwrap();
        assert_eq!(CliConfig::load(&cwd).unwrap().document, "mine.json");

        init(args(true), &cwd).unwrap();
        assert_eq!(CliConfig::load(&cwd).unwrap().document, "document.json");
    }
}
