use loom_core::error::GraphError;
use thiserror::Error;

/// Errors surfaced by editor operations that can fail as a whole.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("failed to encode clipboard: {0}")]
    ClipboardEncode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode clipboard: {0}")]
    ClipboardDecode(#[from] rmp_serde::decode::Error),
    #[error("clipboard is empty")]
    EmptyClipboard,
}
