use crate::commands::open_session;
use crate::render::outline;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livedit_editor::DurableStore;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Print the stored JSON instead of an outline
    #[arg(long)]
    pub json: bool,
}

pub fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let (config, session) = open_session(cwd, false, std::time::Duration::ZERO)?;

    if args.json {
        match session.persisted_state() {
            Some(state) => println!("{}", state),
            None => println!("{}", serde_json::to_string_pretty(session.document().root())?),
        }
        return Ok(());
    }

    let saved = session.store().load(&config.editor.storage_key)?.is_some();
    let source = if saved {
        format!("saved state in {}", config.store_dir)
    } else {
        format!("template {}", config.document)
    };
    println!("{} {}", "📄".bright_blue(), source.bright_white());
    println!();
    for line in outline(session.document().root(), false) {
        println!("{}", line);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG_NAME;
    use livedit_editor::FileStore;

    #[test]
    fn test_show_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        std::fs::write(
            dir.path().join("document.json"),
            r#"{"tag":"main","children":[{"tag":"h1","text":"Hi"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{}").unwrap();

        show(ShowArgs { json: true }, &cwd).unwrap();
        show(ShowArgs { json: false }, &cwd).unwrap();

        let store = FileStore::open(dir.path().join(".livedit")).unwrap();
        assert!(store.load("livedit_content").unwrap().is_none());
    }
}
