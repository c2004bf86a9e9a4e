//! Web search for outline context.
use crate::fetch::FetchOutcome;
use regex::Regex;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    /// Raw snippet as returned by the engine; may contain HTML.
    pub snippet: String,
}

pub trait SearchProvider {
    fn search(&self, query: &str, max_results: usize) -> FetchOutcome<Vec<SearchResult>>;
}

/// DuckDuckGo's HTML results page, parsed with regular expressions.
pub struct DuckDuckGo {
    agent: ureq::Agent,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchProvider for DuckDuckGo {
    fn search(&self, query: &str, max_results: usize) -> FetchOutcome<Vec<SearchResult>> {
        let response = self
            .agent
            .get(SEARCH_URL)
            .query("q", query)
            .header("User-Agent", "Mozilla/5.0 (X11; Linux x86_64)")
            .call();
        let page = match response {
            Ok(mut response) => match response.body_mut().read_to_string() {
                Ok(page) => page,
                Err(err) => return FetchOutcome::Err(format!("read search page: {err}")),
            },
            Err(err) => return FetchOutcome::Err(format!("search request: {err}")),
        };
        let results = parse_results_page(&page, max_results);
        tracing::info!(query, results = results.len(), "web search complete");
        if results.is_empty() {
            FetchOutcome::Degraded(results)
        } else {
            FetchOutcome::Ok(results)
        }
    }
}

/// Search provider used when enrichment is turned off.
pub struct NoSearch;

impl SearchProvider for NoSearch {
    fn search(&self, _query: &str, _max_results: usize) -> FetchOutcome<Vec<SearchResult>> {
        FetchOutcome::Degraded(Vec::new())
    }
}

fn parse_results_page(page: &str, max_results: usize) -> Vec<SearchResult> {
    let links = Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("regex for result links");
    let snippets = Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#)
        .expect("regex for result snippets");

    let snippet_texts: Vec<&str> = snippets
        .captures_iter(page)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect();

    links
        .captures_iter(page)
        .enumerate()
        .take(max_results)
        .map(|(index, cap)| {
            let href = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = cap.get(2).map(|m| m.as_str()).unwrap_or_default();
            SearchResult {
                title: html_to_text(title),
                url: resolve_result_url(href),
                snippet: snippet_texts
                    .get(index)
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
            }
        })
        .collect()
}

/// Result links point at a redirector carrying the target in `uddg`.
fn resolve_result_url(href: &str) -> String {
    let href = decode_entities(href);
    let Some((_, query)) = href.split_once('?') else {
        return href;
    };
    for pair in query.split('&') {
        if let Some(encoded) = pair.strip_prefix("uddg=") {
            if let Ok(decoded) = urlencoding::decode(encoded) {
                return decoded.into_owned();
            }
        }
    }
    href
}

/// Reduce an HTML fragment to plain text: tags removed, entities decoded,
/// whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    let tags = Regex::new(r"(?s)<[^>]*>").expect("regex for html tags");
    let stripped = tags.replace_all(html, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    let entity =
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("regex for entities");
    entity
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let hex = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"));
            let decoded = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            match decoded {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
