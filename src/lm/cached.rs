use super::LanguageModel;
use crate::cache::ResponseCache;
use crate::error::DeckError;
use crate::util::short_digest;

/// Counters for how model requests were served during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    pub backend_calls: usize,
    pub cache_hits: usize,
}

/// A language model fronted by the response cache.
///
/// Every request goes through here. A hit never reaches the backend; a miss
/// calls the backend and writes the response through before returning it.
pub struct CachedModel {
    model: Box<dyn LanguageModel>,
    cache: ResponseCache,
    stats: CallStats,
}

impl CachedModel {
    pub fn new(model: Box<dyn LanguageModel>, cache: ResponseCache) -> Self {
        Self {
            model,
            cache,
            stats: CallStats::default(),
        }
    }

    pub fn complete(&mut self, prompt: &str) -> Result<String, DeckError> {
        let key = short_digest(prompt);
        if let Some(hit) = self.cache.get(prompt) {
            self.stats.cache_hits += 1;
            tracing::debug!(%key, "response cache hit");
            return Ok(hit.to_string());
        }
        tracing::debug!(%key, backend = self.model.name(), "response cache miss");
        let response = self.model.complete(prompt)?;
        self.stats.backend_calls += 1;
        self.cache.put(prompt, &response)?;
        Ok(response)
    }

    pub fn stats(&self) -> CallStats {
        self.stats
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    #[test]
    fn second_run_with_identical_prompt_skips_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cache.json");
        let prompt = "topic=Cats,slides=3";

        let first = ScriptedModel::replying("outline text");
        let calls = first.calls();
        let mut model = CachedModel::new(
            Box::new(first),
            ResponseCache::open(&path).expect("open cache"),
        );
        assert_eq!(model.complete(prompt).expect("first run"), "outline text");
        assert_eq!(calls.get(), 1);
        assert_eq!(
            model.stats(),
            CallStats {
                backend_calls: 1,
                cache_hits: 0
            }
        );

        let second = ScriptedModel::replying("different text");
        let second_calls = second.calls();
        let mut model = CachedModel::new(
            Box::new(second),
            ResponseCache::open(&path).expect("reopen cache"),
        );
        assert_eq!(model.complete(prompt).expect("second run"), "outline text");
        assert_eq!(second_calls.get(), 0);
        assert_eq!(model.stats().cache_hits, 1);
    }

    #[test]
    fn whitespace_change_defeats_the_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedModel::replying("reply");
        let calls = scripted.calls();
        let mut model = CachedModel::new(
            Box::new(scripted),
            ResponseCache::open(dir.path().join("cache.json")).expect("open cache"),
        );
        model.complete("prompt").expect("first");
        model.complete("prompt ").expect("second");
        assert_eq!(calls.get(), 2);
        assert_eq!(model.cache().len(), 2);
    }

    #[test]
    fn backend_failure_is_not_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut model = CachedModel::new(
            Box::new(ScriptedModel::failing()),
            ResponseCache::open(dir.path().join("cache.json")).expect("open cache"),
        );
        let err = model.complete("prompt").unwrap_err();
        assert!(matches!(err, DeckError::Transport { .. }));
        assert!(model.cache().is_empty());
        assert_eq!(model.stats().backend_calls, 0);
    }
}
