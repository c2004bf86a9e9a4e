//! Image lookup for picture slides.
//!
//! `BingImages` scrapes the first full-size result from Bing's image search
//! page, downloads it into the images directory, and remembers
//! `query → file name` in `cache.json` next to the images so repeated queries
//! never hit the network.
use crate::cache::ResponseCache;
use crate::error::DeckError;
use crate::fetch::FetchOutcome;
use crate::util::sha256_hex;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const PLACEHOLDER_IMAGE: &str = "default.png";
pub const IMAGE_CACHE_FILE: &str = "cache.json";

const SEARCH_URL: &str = "https://www.bing.com/images/search";
const KNOWN_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "tiff", "gif", "ppm", "pgm"];
const DEFAULT_EXTENSION: &str = "jpg";

/// A local image file the renderer can embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The default image used whenever a lookup produces nothing.
    pub fn placeholder(images_dir: &Path) -> Self {
        Self(images_dir.join(PLACEHOLDER_IMAGE))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

pub trait ImageProvider {
    fn fetch(&mut self, query: &str) -> FetchOutcome<ImageRef>;

    fn placeholder(&self) -> ImageRef;
}

/// Provider used when image lookup is turned off.
pub struct DisabledImages {
    images_dir: PathBuf,
}

impl DisabledImages {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }
}

impl ImageProvider for DisabledImages {
    fn fetch(&mut self, _query: &str) -> FetchOutcome<ImageRef> {
        FetchOutcome::Degraded(self.placeholder())
    }

    fn placeholder(&self) -> ImageRef {
        ImageRef::placeholder(&self.images_dir)
    }
}

pub struct BingImages {
    agent: ureq::Agent,
    images_dir: PathBuf,
    lookups: ResponseCache,
}

impl BingImages {
    pub fn open(images_dir: impl Into<PathBuf>) -> Result<Self, DeckError> {
        let images_dir = images_dir.into();
        let lookups = ResponseCache::open(images_dir.join(IMAGE_CACHE_FILE))?;
        Ok(Self {
            agent: ureq::Agent::new_with_defaults(),
            images_dir,
            lookups,
        })
    }

    fn search_image_url(&self, query: &str) -> Result<Option<String>, String> {
        let mut response = self
            .agent
            .get(SEARCH_URL)
            .query("q", query)
            .query("form", "HDRSC2")
            .header("User-Agent", "Mozilla/5.0 (X11; Linux x86_64)")
            .call()
            .map_err(|err| format!("image search: {err}"))?;
        let page = response
            .body_mut()
            .read_to_string()
            .map_err(|err| format!("read image search page: {err}"))?;
        Ok(first_image_url(&page))
    }

    fn download(&self, url: &str) -> Result<String, String> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", "Mozilla/5.0 (X11; Linux x86_64)")
            .call()
            .map_err(|err| format!("download {url}: {err}"))?;
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|err| format!("read {url}: {err}"))?;
        let name = image_file_name(url);
        fs::create_dir_all(&self.images_dir)
            .map_err(|err| format!("create {}: {err}", self.images_dir.display()))?;
        let path = self.images_dir.join(&name);
        fs::write(&path, &bytes).map_err(|err| format!("write {}: {err}", path.display()))?;
        Ok(name)
    }
}

impl ImageProvider for BingImages {
    fn fetch(&mut self, query: &str) -> FetchOutcome<ImageRef> {
        if let Some(name) = self.lookups.get(query) {
            let path = self.images_dir.join(name);
            if path.is_file() {
                tracing::debug!(query, file = name, "image cache hit");
                return FetchOutcome::Ok(ImageRef::new(path));
            }
        }

        let url = match self.search_image_url(query) {
            Ok(Some(url)) => url,
            Ok(None) => {
                tracing::warn!(query, "no image found, using placeholder");
                return FetchOutcome::Degraded(self.placeholder());
            }
            Err(reason) => return FetchOutcome::Err(reason),
        };
        let name = match self.download(&url) {
            Ok(name) => name,
            Err(reason) => return FetchOutcome::Err(reason),
        };
        if let Err(err) = self.lookups.put(query, &name) {
            tracing::warn!(query, error = %err, "failed to record image lookup");
        }
        tracing::info!(query, file = %name, "image downloaded");
        FetchOutcome::Ok(ImageRef::new(self.images_dir.join(name)))
    }

    fn placeholder(&self) -> ImageRef {
        ImageRef::placeholder(&self.images_dir)
    }
}

/// First full-size image URL in a Bing results page, if any.
fn first_image_url(page: &str) -> Option<String> {
    let murl = Regex::new(r#"murl&quot;:&quot;(.*?)&quot;"#).expect("regex for image urls");
    murl.captures(page)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter(|url| url.starts_with("http"))
}

/// Stable file name for a downloaded image: a digest of the URL path plus a
/// known image extension.
fn image_file_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = without_query
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, path)| path).unwrap_or(""))
        .unwrap_or(without_query);
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| KNOWN_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    let mut digest = sha256_hex(path.as_bytes());
    digest.truncate(16);
    format!("{digest}.{extension}")
}
