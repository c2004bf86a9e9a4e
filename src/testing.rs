//! Test doubles for the external collaborators.
use crate::error::DeckError;
use crate::fetch::FetchOutcome;
use crate::image::{ImageProvider, ImageRef};
use crate::lm::LanguageModel;
use crate::render::DeckRenderer;
use crate::search::{SearchProvider, SearchResult};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

type Reply = Result<String, String>;

/// Language model that answers from a script and counts its invocations.
pub(crate) struct ScriptedModel {
    rules: Vec<(String, Reply)>,
    default: Reply,
    calls: Rc<Cell<usize>>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedModel {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            rules: Vec::new(),
            default: Ok(reply.to_string()),
            calls: Rc::new(Cell::new(0)),
            prompts: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            default: Err("backend unavailable".to_string()),
            ..Self::replying("")
        }
    }

    /// Reply with `reply` to prompts containing `needle`. Earlier rules win.
    pub(crate) fn when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(reply.to_string())));
        self
    }

    pub(crate) fn fail_when(mut self, needle: &str) -> Self {
        self.rules
            .push((needle.to_string(), Err(format!("scripted failure on {needle:?}"))));
        self
    }

    pub(crate) fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }

    pub(crate) fn prompts(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.prompts)
    }
}

impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(&self, prompt: &str) -> Result<String, DeckError> {
        self.calls.set(self.calls.get() + 1);
        self.prompts.borrow_mut().push(prompt.to_string());
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default);
        reply
            .clone()
            .map_err(|reason| DeckError::transport("scripted", reason))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RenderCall {
    Title {
        title: String,
        subtitle: String,
    },
    Content {
        title: String,
        body: String,
    },
    TwoContent {
        title: String,
        left: String,
        right: String,
    },
    Picture {
        title: String,
        image: ImageRef,
        caption: String,
    },
    TitleOnly {
        title: String,
    },
}

/// Renderer that records every call instead of producing a file.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    pub(crate) calls: Vec<RenderCall>,
    pub(crate) saved: Cell<bool>,
}

impl DeckRenderer for RecordingRenderer {
    fn create_title_slide(&mut self, title: &str, subtitle: &str) -> Result<(), DeckError> {
        self.calls.push(RenderCall::Title {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
        });
        Ok(())
    }

    fn create_content_slide(&mut self, title: &str, body: &str) -> Result<(), DeckError> {
        self.calls.push(RenderCall::Content {
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    fn create_two_content_slide(
        &mut self,
        title: &str,
        left: &str,
        right: &str,
    ) -> Result<(), DeckError> {
        self.calls.push(RenderCall::TwoContent {
            title: title.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        });
        Ok(())
    }

    fn create_picture_with_caption_slide(
        &mut self,
        title: &str,
        image: &ImageRef,
        caption: &str,
    ) -> Result<(), DeckError> {
        self.calls.push(RenderCall::Picture {
            title: title.to_string(),
            image: image.clone(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    fn create_title_only_slide(&mut self, title: &str) -> Result<(), DeckError> {
        self.calls.push(RenderCall::TitleOnly {
            title: title.to_string(),
        });
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.calls.len()
    }

    fn save(&self, _dir: &Path) -> Result<String, DeckError> {
        self.saved.set(true);
        Ok("recorded.md".to_string())
    }
}

/// Image provider that serves `images/<query>.png` unless told to fail.
#[derive(Default)]
pub(crate) struct ScriptedImages {
    pub(crate) queries: Vec<String>,
    fail: bool,
}

impl ScriptedImages {
    pub(crate) fn failing() -> Self {
        Self {
            queries: Vec::new(),
            fail: true,
        }
    }
}

impl ImageProvider for ScriptedImages {
    fn fetch(&mut self, query: &str) -> FetchOutcome<ImageRef> {
        self.queries.push(query.to_string());
        if self.fail {
            return FetchOutcome::Err("image host unreachable".to_string());
        }
        FetchOutcome::Ok(ImageRef::new(format!("images/{query}.png")))
    }

    fn placeholder(&self) -> ImageRef {
        ImageRef::placeholder(Path::new("images"))
    }
}

/// Search provider with a fixed answer that remembers the requested limit.
pub(crate) struct ScriptedSearch {
    outcome: FetchOutcome<Vec<SearchResult>>,
    last_max_results: Cell<Option<usize>>,
}

impl ScriptedSearch {
    pub(crate) fn returning(results: Vec<SearchResult>) -> Self {
        Self {
            outcome: FetchOutcome::Ok(results),
            last_max_results: Cell::new(None),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            outcome: FetchOutcome::Err("search offline".to_string()),
            last_max_results: Cell::new(None),
        }
    }

    pub(crate) fn last_max_results(&self) -> Option<usize> {
        self.last_max_results.get()
    }
}

impl SearchProvider for ScriptedSearch {
    fn search(&self, _query: &str, max_results: usize) -> FetchOutcome<Vec<SearchResult>> {
        self.last_max_results.set(Some(max_results));
        self.outcome.clone()
    }
}
