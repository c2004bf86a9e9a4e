//! Language model backends.
//!
//! A backend is chosen once from configuration and handed around as a
//! `Box<dyn LanguageModel>`; nothing reads backend settings after that.
//!
//! # Backends
//!
//! - `openai`: chat completions over HTTPS with a bearer key
//! - `ollama`: a local or remote Ollama server
//! - `command`: any local command that reads the prompt on stdin and prints
//!   the response on stdout (e.g. `llm`, `ollama run llama3`, a test script)
//!
//! Calls block until the backend answers. There is no timeout or retry here;
//! callers that need either must add it around `complete`.
mod cached;
mod command;
mod ollama;
mod openai;

pub use cached::{CachedModel, CallStats};
pub use command::CommandModel;
pub use ollama::OllamaModel;
pub use openai::OpenAiModel;

use crate::config::BackendSettings;
use crate::error::DeckError;

pub const DEFAULT_OPENAI_HOST: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// The single capability the pipeline needs from a generative backend.
pub trait LanguageModel {
    /// Short backend label for logs and errors.
    fn name(&self) -> &str;

    fn complete(&self, prompt: &str) -> Result<String, DeckError>;
}

/// A fully resolved backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    OpenAi {
        host: String,
        api_key: String,
        model: String,
    },
    Ollama {
        host: String,
        api_key: Option<String>,
        model: String,
    },
    Command {
        command: String,
    },
}

impl Backend {
    /// Resolve a backend from loosely typed settings.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self, DeckError> {
        match settings.provider.trim().to_ascii_lowercase().as_str() {
            "openai" => {
                let api_key = settings.api_key.clone().ok_or_else(|| {
                    DeckError::Configuration(
                        "openai backend requires an API key (--api-key or API_KEY)".to_string(),
                    )
                })?;
                Ok(Self::OpenAi {
                    host: settings
                        .host
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPENAI_HOST.to_string()),
                    api_key,
                    model: settings
                        .model
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                })
            }
            "ollama" => Ok(Self::Ollama {
                host: settings
                    .host
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
                api_key: settings.api_key.clone(),
                model: settings
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            }),
            "command" => {
                let command = settings
                    .command
                    .clone()
                    .filter(|command| !command.trim().is_empty())
                    .ok_or_else(|| {
                        DeckError::Configuration(
                            "command backend requires --lm-command or DECKGEN_LM_COMMAND"
                                .to_string(),
                        )
                    })?;
                Ok(Self::Command { command })
            }
            other => Err(DeckError::Configuration(format!(
                "unsupported provider {other:?} (expected openai, ollama, or command)"
            ))),
        }
    }
}

/// Construct the client for a backend.
pub fn build_client(backend: &Backend) -> Result<Box<dyn LanguageModel>, DeckError> {
    let client: Box<dyn LanguageModel> = match backend {
        Backend::OpenAi {
            host,
            api_key,
            model,
        } => Box::new(OpenAiModel::new(host, api_key, model)),
        Backend::Ollama {
            host,
            api_key,
            model,
        } => Box::new(OllamaModel::new(host, api_key.as_deref(), model)),
        Backend::Command { command } => Box::new(CommandModel::new(command)?),
    };
    tracing::info!(backend = client.name(), "language model selected");
    Ok(client)
}

fn trim_host(host: &str) -> &str {
    host.trim_end_matches('/')
}
