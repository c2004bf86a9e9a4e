//! CLI argument parsing.
//!
//! Flags map one-to-one onto `config::Overrides`; resolution against the
//! config file and environment happens in `config`.
use crate::config::Overrides;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "deckgen",
    version,
    about = "Generate slide decks from a topic with a language model",
    after_help = "Examples:\n  deckgen generate --topic \"Cats\" --slides 5 --api-key sk-...\n  deckgen generate --topic \"Rust\" --slides 8 --backend ollama --model llama3\n  deckgen generate --topic \"Tea\" --slides 4 --backend command --lm-command \"llm -m gpt-4o\"\n  deckgen outline --input outline.txt --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Generate(GenerateArgs),
    Outline(OutlineArgs),
}

/// Generate command inputs.
#[derive(Parser, Debug)]
#[command(about = "Generate a presentation for a topic")]
pub struct GenerateArgs {
    /// Presentation topic
    #[arg(long)]
    pub topic: String,

    /// Number of slides to ask the model for
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub slides: u32,

    /// API key for the backend (overrides API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Backend provider: openai, ollama, or command
    #[arg(long, value_name = "NAME")]
    pub backend: Option<String>,

    /// Backend base URL
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// Command for the `command` backend; reads the prompt on stdin
    #[arg(long, value_name = "CMD")]
    pub lm_command: Option<String>,

    /// Directory the deck is written to
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Directory downloaded images are stored in
    #[arg(long, value_name = "DIR")]
    pub images: Option<PathBuf>,

    /// Response cache file
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// JSON config file (overrides DECKGEN_CONFIG)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip web search enrichment
    #[arg(long)]
    pub no_search: bool,

    /// Use the placeholder image for every picture slide
    #[arg(long)]
    pub no_images: bool,

    /// Drop slides whose model call fails instead of aborting
    #[arg(long)]
    pub skip_failed_slides: bool,

    /// Emit progress logs to stderr
    #[arg(long)]
    pub verbose: bool,
}

impl GenerateArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            provider: self.backend.clone(),
            host: self.host.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            lm_command: self.lm_command.clone(),
            output_path: self.output.clone(),
            images_path: self.images.clone(),
            cache_path: self.cache.clone(),
            no_search: self.no_search,
            no_images: self.no_images,
            skip_failed_slides: self.skip_failed_slides,
        }
    }
}

/// Outline command inputs.
#[derive(Parser, Debug)]
#[command(about = "Parse a saved outline and print its slides")]
pub struct OutlineArgs {
    /// File containing raw tagged outline text
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_flags_become_overrides() {
        let args = RootArgs::try_parse_from([
            "deckgen",
            "generate",
            "--topic",
            "Cats",
            "--slides",
            "4",
            "--backend",
            "ollama",
            "--no-images",
            "--cache",
            "/tmp/c.json",
        ])
        .expect("parse");
        let Command::Generate(generate) = args.command else {
            panic!("expected generate");
        };
        assert_eq!(generate.topic, "Cats");
        assert_eq!(generate.slides, 4);
        let overrides = generate.overrides();
        assert_eq!(overrides.provider.as_deref(), Some("ollama"));
        assert!(overrides.no_images);
        assert!(!overrides.no_search);
        assert_eq!(overrides.cache_path, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn topic_and_slides_are_required() {
        assert!(RootArgs::try_parse_from(["deckgen", "generate", "--topic", "Cats"]).is_err());
        assert!(RootArgs::try_parse_from(["deckgen", "generate", "--slides", "3"]).is_err());
        assert!(RootArgs::try_parse_from([
            "deckgen", "generate", "--topic", "Cats", "--slides", "0"
        ])
        .is_err());
    }
}
