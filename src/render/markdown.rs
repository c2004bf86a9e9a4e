//! Marp-flavored Markdown presentation writer.
//!
//! Slides are separated by `---`. Two-column slides use a small grid style
//! declared once in the front matter.
use super::{artifact_stem, DeckRenderer};
use crate::error::DeckError;
use crate::image::ImageRef;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "md";

const FRONT_MATTER_STYLE: &str = "style: |\n  .columns { display: grid; grid-template-columns: 1fr 1fr; gap: 1em; }\n";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slide {
    Title { title: String, subtitle: String },
    Content { title: String, body: String },
    TwoContent { title: String, left: String, right: String },
    Picture { title: String, image: PathBuf, caption: String },
    TitleOnly { title: String },
}

impl Slide {
    fn title(&self) -> &str {
        match self {
            Self::Title { title, .. }
            | Self::Content { title, .. }
            | Self::TwoContent { title, .. }
            | Self::Picture { title, .. }
            | Self::TitleOnly { title } => title,
        }
    }
}

/// In-memory deck that renders to a single Markdown file on `save`.
#[derive(Debug, Default)]
pub struct MarkdownDeck {
    slides: Vec<Slide>,
    fallback_name: Option<String>,
}

impl MarkdownDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the artifact after `name` when the first slide's title cannot.
    pub fn with_fallback_name(mut self, name: &str) -> Self {
        self.fallback_name = Some(name.to_string());
        self
    }

    /// Title of the first slide, which names the saved artifact.
    pub fn title(&self) -> Option<&str> {
        self.slides.first().map(Slide::title)
    }

    /// Render the deck to Markdown. Image paths are written relative to `dir`
    /// when the image lives under it.
    pub fn to_markdown(&self, dir: &Path) -> String {
        let mut out = String::from("---\nmarp: true\n");
        if let Some(title) = self.title() {
            let _ = writeln!(out, "title: {}", yaml_string(title));
        }
        out.push_str(FRONT_MATTER_STYLE);
        out.push_str("---\n");

        for (index, slide) in self.slides.iter().enumerate() {
            if index > 0 {
                out.push_str("\n---\n");
            }
            out.push('\n');
            match slide {
                Slide::Title { title, subtitle } => {
                    out.push_str("<!-- _class: lead -->\n\n");
                    let _ = writeln!(out, "# {}", single_line(title));
                    if !subtitle.is_empty() {
                        let _ = writeln!(out, "\n## {}", single_line(subtitle));
                    }
                }
                Slide::Content { title, body } => {
                    let _ = writeln!(out, "# {}\n", single_line(title));
                    let _ = writeln!(out, "{}", escape_body(body));
                }
                Slide::TwoContent { title, left, right } => {
                    let _ = writeln!(out, "# {}\n", single_line(title));
                    out.push_str("<div class=\"columns\">\n<div>\n\n");
                    let _ = writeln!(out, "{}", escape_body(left));
                    out.push_str("\n</div>\n<div>\n\n");
                    let _ = writeln!(out, "{}", escape_body(right));
                    out.push_str("\n</div>\n</div>\n");
                }
                Slide::Picture {
                    title,
                    image,
                    caption,
                } => {
                    let _ = writeln!(out, "# {}\n", single_line(title));
                    let _ = writeln!(out, "![bg right:40% contain]({})\n", image_link(image, dir));
                    let _ = writeln!(out, "{}", escape_body(caption));
                }
                Slide::TitleOnly { title } => {
                    out.push_str("<!-- _class: lead -->\n\n");
                    let _ = writeln!(out, "# {}", single_line(title));
                }
            }
        }
        out
    }
}

impl DeckRenderer for MarkdownDeck {
    fn create_title_slide(&mut self, title: &str, subtitle: &str) -> Result<(), DeckError> {
        self.slides.push(Slide::Title {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
        });
        Ok(())
    }

    fn create_content_slide(&mut self, title: &str, body: &str) -> Result<(), DeckError> {
        self.slides.push(Slide::Content {
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
        self.slides.push(Slide::TwoContent {
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
        self.slides.push(Slide::Picture {
            title: title.to_string(),
            image: image.path().to_path_buf(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    fn create_title_only_slide(&mut self, title: &str) -> Result<(), DeckError> {
        self.slides.push(Slide::TitleOnly {
            title: title.to_string(),
        });
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn save(&self, dir: &Path) -> Result<String, DeckError> {
        let title = self
            .title()
            .ok_or_else(|| DeckError::Render("deck has no slides".to_string()))?;
        let mut stem = artifact_stem(title);
        if stem.is_empty() {
            if let Some(fallback) = &self.fallback_name {
                stem = artifact_stem(fallback);
            }
        }
        if stem.is_empty() {
            return Err(DeckError::Render(format!(
                "first slide title {title:?} cannot name a file"
            )));
        }
        fs::create_dir_all(dir).map_err(|err| DeckError::io(dir, err))?;
        let name = format!("{stem}.{EXTENSION}");
        let path = dir.join(&name);
        fs::write(&path, self.to_markdown(dir)).map_err(|err| DeckError::io(&path, err))?;
        tracing::info!(path = %path.display(), slides = self.slides.len(), "deck saved");
        Ok(name)
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// A thematic break inside a body would otherwise end the slide.
fn escape_body(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| {
            if is_thematic_break(line) {
                let indent = &line[..line.len() - line.trim_start().len()];
                format!("{indent}\\{}", line.trim_start().trim_end())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// CommonMark thematic break: at most three spaces of indent, then three or
/// more of the same `-`, `*` or `_`, optionally separated by spaces or tabs.
fn is_thematic_break(line: &str) -> bool {
    let body = line.trim_start_matches(' ');
    if line.len() - body.len() > 3 {
        return false;
    }
    let mut markers = body.chars().filter(|ch| !matches!(ch, ' ' | '\t'));
    let Some(marker) = markers.next() else {
        return false;
    };
    if !matches!(marker, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for ch in markers {
        if ch != marker {
            return false;
        }
        count += 1;
    }
    count >= 3
}

fn yaml_string(text: &str) -> String {
    serde_json::to_string(&single_line(text)).unwrap_or_else(|_| "\"\"".to_string())
}

fn image_link(image: &Path, dir: &Path) -> String {
    let resolved = match (image.canonicalize(), dir.canonicalize()) {
        (Ok(image), Ok(dir)) => match image.strip_prefix(&dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => image,
        },
        (Ok(image), Err(_)) => image,
        _ => image.to_path_buf(),
    };
    resolved.display().to_string().replace(' ', "%20")
}
