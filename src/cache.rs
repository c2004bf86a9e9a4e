//! Persisted request → response store.
//!
//! The whole store is loaded at construction and every `put` re-reads the file,
//! merges the new entry, and rewrites the file whole. Keys are compared
//! byte-for-byte with no normalization, so any change to prompt construction
//! produces a cold entry.
//!
//! There is no cross-process locking: two processes writing the same store can
//! lose an update. The store assumes a single active writer.
use crate::error::DeckError;
use crate::util::short_digest;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct ResponseCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl ResponseCache {
    /// Load the store at `path`. A missing file is an empty store; an
    /// unparseable one is reset to empty with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DeckError> {
        let path = path.into();
        let entries = read_store(&path)?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "cache loaded");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, request: &str) -> Option<&str> {
        self.entries.get(request).map(String::as_str)
    }

    /// Record a response and write it through to disk immediately.
    pub fn put(&mut self, request: &str, response: &str) -> Result<(), DeckError> {
        let mut on_disk = read_store(&self.path)?;
        on_disk.insert(request.to_string(), response.to_string());
        write_store(&self.path, &on_disk)?;
        tracing::debug!(
            key = %short_digest(request),
            entries = on_disk.len(),
            "cache entry written"
        );
        self.entries = on_disk;
        Ok(())
    }
}

fn read_store(path: &Path) -> Result<BTreeMap<String, String>, DeckError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => return Err(DeckError::io(path, err)),
    };
    match serde_json::from_slice(&bytes) {
        Ok(entries) => Ok(entries),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "cache file is corrupted, starting with an empty cache"
            );
            Ok(BTreeMap::new())
        }
    }
}

fn write_store(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), DeckError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|err| DeckError::io(&parent, err))?;
    let bytes = serde_json::to_vec_pretty(entries)?;
    let mut staged =
        tempfile::NamedTempFile::new_in(&parent).map_err(|err| DeckError::io(&parent, err))?;
    staged
        .write_all(&bytes)
        .map_err(|err| DeckError::io(staged.path(), err))?;
    staged
        .persist(path)
        .map_err(|err| DeckError::io(path, err.error))?;
    Ok(())
}
