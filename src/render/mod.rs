//! Deck rendering.
//!
//! The pipeline talks to a renderer through `DeckRenderer` only. Each call
//! appends one slide; `save` writes the finished deck and reports its file name.
mod markdown;

pub use markdown::MarkdownDeck;

use crate::error::DeckError;
use crate::image::ImageRef;
use std::path::Path;

pub trait DeckRenderer {
    fn create_title_slide(&mut self, title: &str, subtitle: &str) -> Result<(), DeckError>;

    fn create_content_slide(&mut self, title: &str, body: &str) -> Result<(), DeckError>;

    fn create_two_content_slide(
        &mut self,
        title: &str,
        left: &str,
        right: &str,
    ) -> Result<(), DeckError>;

    fn create_picture_with_caption_slide(
        &mut self,
        title: &str,
        image: &ImageRef,
        caption: &str,
    ) -> Result<(), DeckError>;

    fn create_title_only_slide(&mut self, title: &str) -> Result<(), DeckError>;

    fn slide_count(&self) -> usize;

    /// Write the deck into `dir`, naming it after the first slide's title.
    /// Returns the artifact's file name.
    fn save(&self, dir: &Path) -> Result<String, DeckError>;
}

/// Turn a slide title into a file stem that is safe on common filesystems.
pub fn artifact_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => ' ',
            ch => ch,
        })
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_stem_replaces_path_separators() {
        assert_eq!(artifact_stem("Cats / Dogs: A Study"), "Cats _ Dogs_ A Study");
        assert_eq!(artifact_stem("  Line\nbreak  "), "Line break");
        assert_eq!(artifact_stem(".."), "");
    }
}
