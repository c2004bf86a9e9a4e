//! Prompt assembly for the outline and per-slide requests.
//!
//! Cache keys are the exact prompt bytes, so these builders must stay
//! deterministic: same inputs, same text.

// Prompt templates loaded at compile time
const OUTLINE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/outline.md"));
const ELABORATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/elaborate.md"
));
const FORMAT_RESULTS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/format_results.md"
));

/// Build the primary request that asks the backend for a tagged outline.
///
/// `context` is embedded verbatim; it is either formatted search results or
/// the "no results" sentinel.
pub fn outline_prompt(topic: &str, slides: u32, context: &str) -> String {
    OUTLINE
        .replace("{topic}", topic)
        .replace("{slides}", &slides.to_string())
        .replace("{context}", context)
}

/// Build the secondary request that expands one slide's notes into a body.
pub fn elaboration_prompt(title: &str, content: &str) -> String {
    ELABORATE
        .replace("{title}", title)
        .replace("{content}", content)
}

pub fn format_results_prompt(results: &str) -> String {
    FORMAT_RESULTS.replace("{results}", results)
}
