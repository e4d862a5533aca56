pub mod edit;
pub mod init;
pub mod show;

pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use show::{show, ShowArgs};

use crate::config::CliConfig;
use anyhow::{Context, Result};
use livedit_editor::{Document, EditSession, FileStore, StaticGate};
use std::time::Duration;

/// Load the project config and open a session over its template and store
pub fn open_session(
    cwd: &str,
    elevated: bool,
    now: Duration,
) -> Result<(CliConfig, EditSession<FileStore>)> {
    let config = CliConfig::load(cwd)?;

    let document_path = config.document_path(cwd);
    let source = std::fs::read_to_string(&document_path)
        .with_context(|| format!("cannot read template {}", document_path.display()))?;
    let template = Document::from_json(&source)
        .with_context(|| format!("invalid template {}", document_path.display()))?;

    let store = FileStore::open(config.store_dir(cwd))?;
    let session = EditSession::open(
        config.editor.clone(),
        template,
        store,
        StaticGate(elevated),
        now,
    )?;

    Ok((config, session))
}
