//! Outline protocol: the tagged text the backend is asked to emit, and its parser.
//!
//! An outline is a sequence of chunks separated by `[SLIDEBREAK]`. Each chunk
//! carries one slide-kind tag and a handful of `[TAG]…[/TAG]` fields. Fields are
//! located independently of each other, so a chunk with its tags in an odd
//! physical order still parses.
mod prompt;
pub mod tags;

pub use prompt::{elaboration_prompt, format_results_prompt, outline_prompt};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tags::*;

pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Title,
    Content,
    Image,
    TwoContent,
    Thanks,
}

/// Kind tags in precedence order. When a chunk carries several kind tags the
/// first entry found wins.
pub const KIND_PRECEDENCE: [(SlideKind, &str); 5] = [
    (SlideKind::Title, TITLE_SLIDE),
    (SlideKind::Content, CONTENT_SLIDE),
    (SlideKind::Image, IMAGE_SLIDE),
    (SlideKind::Thanks, THANKS_SLIDE),
    (SlideKind::TwoContent, TWO_CONTENT_SLIDE),
];

impl SlideKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Title => TITLE_SLIDE,
            Self::Content => CONTENT_SLIDE,
            Self::Image => IMAGE_SLIDE,
            Self::TwoContent => TWO_CONTENT_SLIDE,
            Self::Thanks => THANKS_SLIDE,
        }
    }

    /// Detect the kind of a chunk using the fixed precedence order.
    pub fn detect(chunk: &str) -> Option<Self> {
        KIND_PRECEDENCE
            .iter()
            .find(|(_, tag)| chunk.contains(tag))
            .map(|(kind, _)| *kind)
    }
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Content => write!(f, "content"),
            Self::Image => write!(f, "image"),
            Self::TwoContent => write!(f, "two_content"),
            Self::Thanks => write!(f, "thanks"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTag {
    Subtitle,
    Content,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Many(Vec<String>),
}

/// One parsed slide: its kind, title, and the fields its kind uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideSpec {
    pub kind: SlideKind,
    pub title: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<FieldTag, FieldValue>,
}

impl SlideSpec {
    /// Single-valued field text, or the first block of a multi-valued field.
    pub fn field(&self, tag: FieldTag) -> &str {
        match self.fields.get(&tag) {
            Some(FieldValue::Single(value)) => value,
            Some(FieldValue::Many(values)) => values.first().map(String::as_str).unwrap_or(""),
            None => "",
        }
    }

    /// All blocks recorded for a field, in source order.
    pub fn blocks(&self, tag: FieldTag) -> &[String] {
        match self.fields.get(&tag) {
            Some(FieldValue::Many(values)) => values,
            Some(FieldValue::Single(value)) => std::slice::from_ref(value),
            None => &[],
        }
    }
}

/// Why a chunk produced no slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownKind,
    InsufficientContent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind => write!(f, "no recognized slide kind tag"),
            Self::InsufficientContent => write!(f, "fewer than two content blocks"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedOutline {
    pub slides: Vec<SlideSpec>,
    /// Non-blank chunks seen between separators.
    pub chunks: usize,
    /// Chunks dropped because no kind tag matched.
    pub dropped: usize,
}

/// Split raw backend text into slide records, in outline order.
pub fn parse_outline(text: &str) -> ParsedOutline {
    let mut parsed = ParsedOutline::default();
    for (index, chunk) in text.split(SLIDE_BREAK).enumerate() {
        if chunk.trim().is_empty() {
            continue;
        }
        parsed.chunks += 1;
        match parse_chunk(chunk) {
            Ok(slide) => parsed.slides.push(slide),
            Err(reason) => {
                tracing::debug!(chunk = index, %reason, "outline chunk dropped");
                parsed.dropped += 1;
            }
        }
    }
    parsed
}

/// Parse a single chunk. Chunks without a recognized kind tag are skipped.
pub fn parse_chunk(chunk: &str) -> Result<SlideSpec, SkipReason> {
    let kind = SlideKind::detect(chunk).ok_or(SkipReason::UnknownKind)?;
    let mut title = extract_tag(chunk, TITLE_START, TITLE_END);
    if title.is_empty() {
        title = UNTITLED.to_string();
    }

    let mut fields = BTreeMap::new();
    match kind {
        SlideKind::Title => {
            let subtitle = extract_tag(chunk, SUBTITLE_START, SUBTITLE_END);
            fields.insert(FieldTag::Subtitle, FieldValue::Single(subtitle));
        }
        SlideKind::Content => {
            let content = extract_tag(chunk, CONTENT_START, CONTENT_END);
            fields.insert(FieldTag::Content, FieldValue::Single(content));
        }
        SlideKind::Image => {
            let content = extract_tag(chunk, CONTENT_START, CONTENT_END);
            let image = extract_tag(chunk, IMAGE_START, IMAGE_END);
            fields.insert(FieldTag::Content, FieldValue::Single(content));
            fields.insert(FieldTag::Image, FieldValue::Single(image));
        }
        SlideKind::TwoContent => {
            let blocks = extract_all_tags(chunk, CONTENT_START, CONTENT_END);
            fields.insert(FieldTag::Content, FieldValue::Many(blocks));
        }
        SlideKind::Thanks => {}
    }

    Ok(SlideSpec {
        kind,
        title,
        fields,
    })
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
