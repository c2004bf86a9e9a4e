//! End-to-end generation: context, outline, assembly, save.
//!
//! `generate_presentation` wires the real collaborators from an `AppConfig`;
//! `run_pipeline` takes them as trait objects so the sequencing can be tested
//! without a network.
use crate::assemble::{AssemblyReport, DeckAssembler, SecondaryFailurePolicy};
use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::enrich::ContextEnricher;
use crate::error::DeckError;
use crate::image::{BingImages, DisabledImages, ImageProvider};
use crate::lm::{build_client, Backend, CachedModel, CallStats};
use crate::outline::{outline_prompt, parse_outline};
use crate::render::{DeckRenderer, MarkdownDeck};
use crate::search::{DuckDuckGo, NoSearch, SearchProvider};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What a deck request asks for.
#[derive(Debug, Clone)]
pub struct DeckRequest<'a> {
    pub topic: &'a str,
    pub slides: u32,
}

/// Knobs for a single pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub max_search_results: usize,
    pub format_search_results: bool,
    pub policy: SecondaryFailurePolicy,
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_search_results: config.max_search_results,
            format_search_results: config.format_search_results,
            policy: config.policy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub artifact: String,
    pub output_dir: PathBuf,
    pub outline_chunks: usize,
    pub dropped_chunks: usize,
    pub rendered: usize,
    pub skipped: usize,
    pub failed: usize,
    pub degraded_images: usize,
    pub backend_calls: usize,
    pub cache_hits: usize,
}

impl GenerationReport {
    fn new(
        artifact: String,
        output_dir: &Path,
        outline: (usize, usize),
        assembly: &AssemblyReport,
        calls: CallStats,
    ) -> Self {
        Self {
            artifact,
            output_dir: output_dir.to_path_buf(),
            outline_chunks: outline.0,
            dropped_chunks: outline.1,
            rendered: assembly.rendered,
            skipped: assembly.skipped,
            failed: assembly.failed,
            degraded_images: assembly.degraded_images,
            backend_calls: calls.backend_calls,
            cache_hits: calls.cache_hits,
        }
    }
}

/// Generate a deck for `topic` and save it under the configured output dir.
pub fn generate_presentation(
    config: &AppConfig,
    topic: &str,
    slides: u32,
) -> Result<GenerationReport, DeckError> {
    let backend = Backend::from_settings(&config.backend)?;
    let client = build_client(&backend)?;
    let cache = ResponseCache::open(&config.cache_path)?;
    let mut model = CachedModel::new(client, cache);

    let search: Box<dyn SearchProvider> = if config.search {
        Box::new(DuckDuckGo::new())
    } else {
        Box::new(NoSearch)
    };
    let mut images: Box<dyn ImageProvider> = if config.images {
        Box::new(BingImages::open(&config.images_dir)?)
    } else {
        Box::new(DisabledImages::new(&config.images_dir))
    };
    let mut deck = MarkdownDeck::new().with_fallback_name(topic);

    run_pipeline(
        &DeckRequest { topic, slides },
        PipelineOptions::from_config(config),
        &mut model,
        search.as_ref(),
        images.as_mut(),
        &mut deck,
        &config.output_dir,
    )
}

/// Run every stage against the given collaborators. Nothing is written to
/// `output_dir` unless every slide was assembled.
pub fn run_pipeline(
    request: &DeckRequest<'_>,
    options: PipelineOptions,
    model: &mut CachedModel,
    search: &dyn SearchProvider,
    images: &mut dyn ImageProvider,
    renderer: &mut dyn DeckRenderer,
    output_dir: &Path,
) -> Result<GenerationReport, DeckError> {
    let started = Instant::now();
    tracing::info!(topic = request.topic, slides = request.slides, "generating deck");

    let mut enricher = ContextEnricher::new(search).with_max_results(options.max_search_results);
    if !options.format_search_results {
        enricher = enricher.without_reformat();
    }
    let context = enricher.context_for(request.topic, model);

    let prompt = outline_prompt(request.topic, request.slides, &context);
    let raw = model.complete(&prompt)?;
    let outline = parse_outline(&raw);
    tracing::info!(
        chunks = outline.chunks,
        slides = outline.slides.len(),
        dropped = outline.dropped,
        "outline parsed"
    );
    if outline.slides.len() != request.slides as usize {
        tracing::warn!(
            requested = request.slides,
            parsed = outline.slides.len(),
            "outline slide count differs from request"
        );
    }

    let assembly = DeckAssembler::new(model, images, renderer)
        .with_policy(options.policy)
        .assemble(&outline.slides)?;
    if renderer.slide_count() == 0 {
        return Err(DeckError::Render(format!(
            "outline for {:?} produced no renderable slides",
            request.topic
        )));
    }

    let artifact = renderer.save(output_dir)?;
    tracing::info!(
        artifact = %artifact,
        cache = %model.cache().path().display(),
        cached_responses = model.cache().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "deck generated"
    );
    Ok(GenerationReport::new(
        artifact,
        output_dir,
        (outline.chunks, outline.dropped),
        &assembly,
        model.stats(),
    ))
}
