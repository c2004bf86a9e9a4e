use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

mod assemble;
mod cache;
mod cli;
mod config;
mod enrich;
mod error;
mod fetch;
mod image;
mod lm;
mod outline;
mod render;
mod search;
#[cfg(test)]
mod testing;
mod util;
mod workflow;

use cli::{Command, GenerateArgs, OutlineArgs, RootArgs};
use config::AppConfig;
use outline::{parse_outline, FieldTag};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    let verbose = matches!(&args.command, Command::Generate(generate) if generate.verbose);
    init_tracing(verbose);

    match args.command {
        Command::Generate(args) => run_generate(args),
        Command::Outline(args) => run_outline(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    config::load_env_file();
    let config = AppConfig::resolve(&args.overrides()).context("resolve configuration")?;
    let report = workflow::generate_presentation(&config, &args.topic, args.slides)
        .with_context(|| format!("generate presentation for {:?}", args.topic))?;
    tracing::info!(
        output_dir = %report.output_dir.display(),
        outline_chunks = report.outline_chunks,
        dropped_chunks = report.dropped_chunks,
        rendered = report.rendered,
        skipped = report.skipped,
        failed = report.failed,
        degraded_images = report.degraded_images,
        backend_calls = report.backend_calls,
        cache_hits = report.cache_hits,
        "run summary"
    );
    println!("Presentation generated: {}", report.artifact);
    Ok(())
}

fn run_outline(args: OutlineArgs) -> Result<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("read outline {}", args.input.display()))?;
    let parsed = parse_outline(&text);
    if args.json {
        let json = serde_json::to_string_pretty(&parsed).context("serialize outline")?;
        println!("{json}");
        return Ok(());
    }
    for (index, slide) in parsed.slides.iter().enumerate() {
        println!(
            "{:>2}. {} {} ({})",
            index + 1,
            slide.kind.tag(),
            slide.title,
            slide.kind
        );
        let blocks = slide.blocks(FieldTag::Content);
        if !blocks.is_empty() {
            println!("    content blocks: {}", blocks.len());
        }
        let image = slide.field(FieldTag::Image);
        if !image.is_empty() {
            println!("    image: {image}");
        }
    }
    println!(
        "{} slides from {} chunks ({} dropped)",
        parsed.slides.len(),
        parsed.chunks,
        parsed.dropped
    );
    Ok(())
}
