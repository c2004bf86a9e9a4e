//! Run configuration.
//!
//! Each setting resolves independently: command-line flag, then the JSON
//! config file, then the environment, then the built-in default. The result
//! is an `AppConfig` built once per run and passed down explicitly.
//!
//! A `.env` file in the working directory (or a parent) feeds the environment
//! layer. Variables already set in the process are never overridden.
use crate::assemble::SecondaryFailurePolicy;
use crate::enrich::DEFAULT_MAX_RESULTS;
use crate::error::DeckError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_CACHE_PATH: &str = "cache.json";

pub const ENV_CONFIG: &str = "DECKGEN_CONFIG";
pub const ENV_PROVIDER: &str = "PROVIDER";
pub const ENV_HOST: &str = "HOST";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_MODEL: &str = "MODEL";
pub const ENV_LM_COMMAND: &str = "DECKGEN_LM_COMMAND";
pub const ENV_OUTPUT_PATH: &str = "OUTPUT_PATH";
pub const ENV_IMAGES_PATH: &str = "IMAGES_PATH";
pub const ENV_CACHE_PATH: &str = "CACHE_PATH";

/// Backend selection before validation. Provider-specific defaults are
/// applied by `lm::Backend::from_settings`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSettings {
    pub provider: String,
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub command: Option<String>,
}

/// On-disk config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub lm_command: Option<String>,
    pub output_path: Option<PathBuf>,
    pub images_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub search: Option<bool>,
    pub images: Option<bool>,
    pub format_search_results: Option<bool>,
    pub max_search_results: Option<usize>,
    pub skip_failed_slides: Option<bool>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub provider: Option<String>,
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub lm_command: Option<String>,
    pub output_path: Option<PathBuf>,
    pub images_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub no_search: bool,
    pub no_images: bool,
    pub skip_failed_slides: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendSettings,
    pub output_dir: PathBuf,
    pub images_dir: PathBuf,
    pub cache_path: PathBuf,
    pub search: bool,
    pub images: bool,
    pub format_search_results: bool,
    pub max_search_results: usize,
    pub policy: SecondaryFailurePolicy,
}

impl AppConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: &Overrides) -> Result<Self, DeckError> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with an injectable environment lookup. Empty values count as unset.
    pub fn resolve_with(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, DeckError> {
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let config_path = overrides
            .config_path
            .clone()
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from));
        let file = match &config_path {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };

        let backend = BackendSettings {
            provider: overrides
                .provider
                .clone()
                .or(file.provider)
                .or_else(|| env(ENV_PROVIDER))
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            host: overrides.host.clone().or(file.host).or_else(|| env(ENV_HOST)),
            api_key: overrides
                .api_key
                .clone()
                .or(file.api_key)
                .or_else(|| env(ENV_API_KEY)),
            model: overrides
                .model
                .clone()
                .or(file.model)
                .or_else(|| env(ENV_MODEL)),
            command: overrides
                .lm_command
                .clone()
                .or(file.lm_command)
                .or_else(|| env(ENV_LM_COMMAND)),
        };

        let path_setting = |flag: &Option<PathBuf>,
                            from_file: Option<PathBuf>,
                            key: &str,
                            default: &str| {
            flag.clone()
                .or(from_file)
                .or_else(|| env(key).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        };
        let output_dir = path_setting(
            &overrides.output_path,
            file.output_path,
            ENV_OUTPUT_PATH,
            DEFAULT_OUTPUT_DIR,
        );
        let images_dir = path_setting(
            &overrides.images_path,
            file.images_path,
            ENV_IMAGES_PATH,
            DEFAULT_IMAGES_DIR,
        );
        let cache_path = path_setting(
            &overrides.cache_path,
            file.cache_path,
            ENV_CACHE_PATH,
            DEFAULT_CACHE_PATH,
        );

        // Flags can only switch features off.
        let search = !overrides.no_search && file.search.unwrap_or(true);
        let images = !overrides.no_images && file.images.unwrap_or(true);
        let skip = overrides.skip_failed_slides || file.skip_failed_slides.unwrap_or(false);

        Ok(Self {
            backend,
            output_dir,
            images_dir,
            cache_path,
            search,
            images,
            format_search_results: file.format_search_results.unwrap_or(true),
            max_search_results: file.max_search_results.unwrap_or(DEFAULT_MAX_RESULTS),
            policy: if skip {
                SecondaryFailurePolicy::SkipSlide
            } else {
                SecondaryFailurePolicy::FailFast
            },
        })
    }
}

/// Merge the nearest `.env` file into the process environment.
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "environment file loaded"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable environment file"),
    }
}

/// Load a JSON config file. Unknown keys are rejected.
pub fn load_file_config(path: &Path) -> Result<FileConfig, DeckError> {
    let bytes = fs::read(path).map_err(|err| DeckError::io(path, err))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        DeckError::Configuration(format!("parse config {}: {err}", path.display()))
    })
}
