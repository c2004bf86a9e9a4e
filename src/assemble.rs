//! Deck assembly: one transition per slide record, in outline order.
//!
//! The assembler owns no deck state of its own. Everything it learns goes
//! either into the renderer or, through `CachedModel`, into the response cache.
use crate::error::DeckError;
use crate::fetch::FetchOutcome;
use crate::image::{ImageProvider, ImageRef};
use crate::lm::CachedModel;
use crate::outline::{elaboration_prompt, FieldTag, SkipReason, SlideKind, SlideSpec};
use crate::render::DeckRenderer;

/// What to do when a per-slide model call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecondaryFailurePolicy {
    /// Abort the whole run.
    #[default]
    FailFast,
    /// Drop the slide and keep going.
    SkipSlide,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
    pub rendered: usize,
    pub skipped: usize,
    pub failed: usize,
    pub degraded_images: usize,
}

enum Transition {
    Rendered,
    Skipped(SkipReason),
}

pub struct DeckAssembler<'a> {
    model: &'a mut CachedModel,
    images: &'a mut dyn ImageProvider,
    renderer: &'a mut dyn DeckRenderer,
    policy: SecondaryFailurePolicy,
    report: AssemblyReport,
}

impl<'a> DeckAssembler<'a> {
    pub fn new(
        model: &'a mut CachedModel,
        images: &'a mut dyn ImageProvider,
        renderer: &'a mut dyn DeckRenderer,
    ) -> Self {
        Self {
            model,
            images,
            renderer,
            policy: SecondaryFailurePolicy::default(),
            report: AssemblyReport::default(),
        }
    }

    pub fn with_policy(mut self, policy: SecondaryFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Render every slide in order. Stops at the first fatal error.
    pub fn assemble(mut self, slides: &[SlideSpec]) -> Result<AssemblyReport, DeckError> {
        for (index, slide) in slides.iter().enumerate() {
            match self.transition(slide) {
                Ok(Transition::Rendered) => {
                    self.report.rendered += 1;
                    tracing::debug!(
                        slide = index,
                        kind = %slide.kind,
                        title = %slide.title,
                        "slide rendered"
                    );
                }
                Ok(Transition::Skipped(reason)) => {
                    self.report.skipped += 1;
                    tracing::debug!(slide = index, kind = %slide.kind, %reason, "slide skipped");
                }
                Err(err @ DeckError::Transport { .. })
                    if self.policy == SecondaryFailurePolicy::SkipSlide =>
                {
                    self.report.failed += 1;
                    tracing::warn!(
                        slide = index,
                        title = %slide.title,
                        error = %err,
                        "slide dropped after model failure"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(self.report)
    }

    fn transition(&mut self, slide: &SlideSpec) -> Result<Transition, DeckError> {
        let title = slide.title.as_str();
        match slide.kind {
            SlideKind::Title => {
                self.renderer
                    .create_title_slide(title, slide.field(FieldTag::Subtitle))?;
            }
            SlideKind::Content => {
                let body = self.elaborate(title, slide.field(FieldTag::Content))?;
                self.renderer.create_content_slide(title, &body)?;
            }
            SlideKind::Image => {
                let body = self.elaborate(title, slide.field(FieldTag::Content))?;
                // Keyed by the title, not the [IMAGE] query.
                let image = self.image_for(title);
                self.renderer
                    .create_picture_with_caption_slide(title, &image, &body)?;
            }
            SlideKind::TwoContent => {
                let [left, right, ..] = slide.blocks(FieldTag::Content) else {
                    return Ok(Transition::Skipped(SkipReason::InsufficientContent));
                };
                let left = self.elaborate(title, left)?;
                let right = self.elaborate(title, right)?;
                self.renderer.create_two_content_slide(title, &left, &right)?;
            }
            SlideKind::Thanks => {
                self.renderer.create_title_only_slide(title)?;
            }
        }
        Ok(Transition::Rendered)
    }

    fn elaborate(&mut self, title: &str, content: &str) -> Result<String, DeckError> {
        let response = self.model.complete(&elaboration_prompt(title, content))?;
        Ok(response.trim().to_string())
    }

    fn image_for(&mut self, query: &str) -> ImageRef {
        let outcome = self.images.fetch(query);
        match &outcome {
            FetchOutcome::Ok(_) => {}
            FetchOutcome::Degraded(_) => self.report.degraded_images += 1,
            FetchOutcome::Err(reason) => {
                self.report.degraded_images += 1;
                tracing::warn!(query, %reason, "image lookup failed, using placeholder");
            }
        }
        outcome.absorb(self.images.placeholder())
    }
}

#[cfg(test)]
#[path = "assemble_tests.rs"]
mod tests;
