//! Context enrichment: web search results folded into the outline prompt.
//!
//! Search trouble never stops a run. Failed or empty searches become the
//! `NO_RESULTS` sentinel, and a failed reformatting call falls back to the
//! unformatted blocks.
use crate::fetch::FetchOutcome;
use crate::lm::CachedModel;
use crate::outline::format_results_prompt;
use crate::search::{html_to_text, SearchProvider, SearchResult};

pub const NO_RESULTS: &str = "No results found.";
pub const DEFAULT_MAX_RESULTS: usize = 5;
const BLOCK_SEPARATOR: &str = "\n---\n";

pub struct ContextEnricher<'a> {
    search: &'a dyn SearchProvider,
    max_results: usize,
    reformat: bool,
}

impl<'a> ContextEnricher<'a> {
    pub fn new(search: &'a dyn SearchProvider) -> Self {
        Self {
            search,
            max_results: DEFAULT_MAX_RESULTS,
            reformat: true,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Skip the model pass and embed the normalized blocks directly.
    pub fn without_reformat(mut self) -> Self {
        self.reformat = false;
        self
    }

    /// Produce the context text for `topic`.
    pub fn context_for(&self, topic: &str, model: &mut CachedModel) -> String {
        let results = match self.search.search(topic, self.max_results) {
            FetchOutcome::Ok(results) | FetchOutcome::Degraded(results) => results,
            FetchOutcome::Err(reason) => {
                tracing::warn!(topic, %reason, "web search failed");
                Vec::new()
            }
        };
        if results.is_empty() {
            return NO_RESULTS.to_string();
        }

        let blocks = render_blocks(&results);
        if !self.reformat {
            return blocks;
        }
        match model.complete(&format_results_prompt(&blocks)) {
            Ok(formatted) => formatted,
            Err(err) => {
                tracing::warn!(error = %err, "formatting search results failed, using raw results");
                blocks
            }
        }
    }
}

/// Normalize results into Markdown blocks joined by a separator.
pub fn render_blocks(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| {
            format!(
                "### [{}]({})\n\n{}\n",
                result.title,
                result.url,
                html_to_text(&result.snippet)
            )
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::testing::{ScriptedModel, ScriptedSearch};

    fn cats() -> SearchResult {
        SearchResult {
            title: "Cats".to_string(),
            url: "https://example.com/cats".to_string(),
            snippet: "Cats <b>purr</b> &amp; nap".to_string(),
        }
    }

    fn dogs() -> SearchResult {
        SearchResult {
            title: "Dogs".to_string(),
            url: "https://example.com/dogs".to_string(),
            snippet: "Dogs bark".to_string(),
        }
    }

    fn model_in(dir: &tempfile::TempDir, scripted: ScriptedModel) -> CachedModel {
        CachedModel::new(
            Box::new(scripted),
            ResponseCache::open(dir.path().join("cache.json")).expect("open cache"),
        )
    }

    #[test]
    fn blocks_are_plain_text_and_separated() {
        assert_eq!(
            render_blocks(&[cats(), dogs()]),
            "### [Cats](https://example.com/cats)\n\nCats purr & nap\n\
             \n---\n\
             ### [Dogs](https://example.com/dogs)\n\nDogs bark\n"
        );
    }

    #[test]
    fn search_failure_yields_sentinel_without_model_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedModel::replying("formatted");
        let calls = scripted.calls();
        let mut model = model_in(&dir, scripted);
        let search = ScriptedSearch::failing();
        let context = ContextEnricher::new(&search).context_for("Cats", &mut model);
        assert_eq!(context, NO_RESULTS);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn empty_search_yields_sentinel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut model = model_in(&dir, ScriptedModel::replying("formatted"));
        let search = ScriptedSearch::returning(Vec::new());
        let context = ContextEnricher::new(&search).context_for("Cats", &mut model);
        assert_eq!(context, NO_RESULTS);
    }

    #[test]
    fn results_are_reformatted_through_the_model() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedModel::replying("formatted");
        let calls = scripted.calls();
        let mut model = model_in(&dir, scripted);
        let search = ScriptedSearch::returning(vec![cats()]);
        let context = ContextEnricher::new(&search).context_for("Cats", &mut model);
        assert_eq!(context, "formatted");
        assert_eq!(calls.get(), 1);
        assert_eq!(search.last_max_results(), Some(DEFAULT_MAX_RESULTS));
    }

    #[test]
    fn reformat_failure_falls_back_to_raw_blocks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut model = model_in(&dir, ScriptedModel::failing());
        let search = ScriptedSearch::returning(vec![cats()]);
        let context = ContextEnricher::new(&search).context_for("Cats", &mut model);
        assert_eq!(context, render_blocks(&[cats()]));
    }

    #[test]
    fn reformat_can_be_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedModel::replying("formatted");
        let calls = scripted.calls();
        let mut model = model_in(&dir, scripted);
        let search = ScriptedSearch::returning(vec![cats(), dogs()]);
        let context = ContextEnricher::new(&search)
            .with_max_results(2)
            .without_reformat()
            .context_for("Cats", &mut model);
        assert_eq!(context, render_blocks(&[cats(), dogs()]));
        assert_eq!(calls.get(), 0);
        assert_eq!(search.last_max_results(), Some(2));
    }
}
