//! Literal tags of the outline protocol and the scanners that read them.

pub const SLIDE_BREAK: &str = "[SLIDEBREAK]";

pub const TITLE_SLIDE: &str = "[L_TS]";
pub const CONTENT_SLIDE: &str = "[L_CS]";
pub const IMAGE_SLIDE: &str = "[L_IS]";
pub const THANKS_SLIDE: &str = "[L_THS]";
pub const TWO_CONTENT_SLIDE: &str = "[L_TCS]";

pub const TITLE_START: &str = "[TITLE]";
pub const TITLE_END: &str = "[/TITLE]";
pub const SUBTITLE_START: &str = "[SUBTITLE]";
pub const SUBTITLE_END: &str = "[/SUBTITLE]";
pub const CONTENT_START: &str = "[CONTENT]";
pub const CONTENT_END: &str = "[/CONTENT]";
pub const IMAGE_START: &str = "[IMAGE]";
pub const IMAGE_END: &str = "[/IMAGE]";

/// Return the trimmed text between the first `start` tag and the first `end`
/// tag after it, or an empty string when either tag is missing.
pub fn extract_tag(text: &str, start: &str, end: &str) -> String {
    match find_enclosed(text, 0, start, end) {
        Some((value, _)) => value.trim().to_string(),
        None => String::new(),
    }
}

/// Collect every `start … end` pair in source order, resuming each scan just
/// past the previously consumed end tag.
pub fn extract_all_tags(text: &str, start: &str, end: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut cursor = 0;
    while let Some((value, next)) = find_enclosed(text, cursor, start, end) {
        values.push(value.trim().to_string());
        cursor = next;
    }
    values
}

// Returns the enclosed slice and the byte offset just past the end tag.
fn find_enclosed<'a>(
    text: &'a str,
    from: usize,
    start: &str,
    end: &str,
) -> Option<(&'a str, usize)> {
    let open = from + text[from..].find(start)?;
    let body_start = open + start.len();
    let close = body_start + text[body_start..].find(end)?;
    Some((&text[body_start..close], close + end.len()))
}
