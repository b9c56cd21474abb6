//! Errors raised by editing tools, commands and the compilation context

use renderer::RenderError;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Command '{name}' failed: {reason}")]
    Command { name: String, reason: String },

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Unterminated variable reference at position {0}")]
    UnterminatedVariable(usize),

    #[error("Cannot redefine undeclared variable '{0}'")]
    UndeclaredVariable(String),

    #[error("The document is no longer available")]
    DocumentUnavailable,

    #[error("Could not access preferences at {path}")]
    Preferences {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid preferences: {0}")]
    Json(#[from] serde_json::Error),
}
