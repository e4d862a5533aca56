//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Selector error: {0}")]
    Selector(#[from] crate::selector::SelectorError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
