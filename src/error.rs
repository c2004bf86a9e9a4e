//! Error taxonomy for deck generation.
//!
//! Only fatal conditions live here. Dropped outline chunks and corrupted cache
//! files are absorbed where they happen and never surface as a `DeckError`.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// Unknown backend identifier or missing backend settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network, API, or subprocess failure while talking to a backend.
    #[error("{provider} request failed: {reason}")]
    Transport { provider: String, reason: String },

    /// The deck cannot be written in its current state.
    #[error("render error: {0}")]
    Render(String),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DeckError {
    pub fn transport(provider: &str, reason: impl ToString) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
