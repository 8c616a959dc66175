//! Document Management
//!
//! Keeps the current content of every referenced document. Content is
//! loaded from storage the first time a document is needed and replaced
//! wholesale on every change batch.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::Url;

use crate::core::patch::Edit;
use crate::error::{Error, Result};

/// Where initial document content comes from.
pub trait DocumentSource: Send {
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads documents from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystem;

impl DocumentSource for FileSystem {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// In-memory document cache keyed by URI.
pub struct DocumentManager {
    documents: HashMap<Url, String>,
    source: Box<dyn DocumentSource>,
}

impl std::fmt::Debug for DocumentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentManager")
            .field("documents", &self.documents.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl DocumentManager {
    pub fn new(source: impl DocumentSource + 'static) -> Self {
        Self {
            documents: HashMap::new(),
            source: Box::new(source),
        }
    }

    /// Current content of `uri`, loading it from storage on a miss.
    ///
    /// A failed load is returned to the caller and leaves nothing cached.
    pub fn get(&mut self, uri: &Url) -> Result<&str> {
        match self.documents.entry(uri.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_str()),
            Entry::Vacant(entry) => {
                let content = load(self.source.as_ref(), uri)?;
                Ok(entry.insert(content).as_str())
            }
        }
    }

    /// Warm the cache for a newly opened document.
    pub fn open(&mut self, uri: &Url) {
        if let Err(e) = self.get(uri) {
            log::warn!("Could not load opened document {}: {}", uri, e);
        }
    }

    /// Apply a batch of edits in order, each against the previous result.
    ///
    /// The stored content only changes if every edit in the batch succeeds.
    pub fn apply_changes(&mut self, uri: &Url, edits: &[Edit]) -> Result<()> {
        let mut current: Option<String> = None;

        for edit in edits {
            let next = match (&current, edit.needs_base()) {
                (Some(content), _) => edit.apply_to(content)?,
                (None, true) => edit.apply_to(self.get(uri)?)?,
                (None, false) => edit.apply_to("")?,
            };
            current = Some(next);
        }

        if let Some(content) = current {
            self.documents.insert(uri.clone(), content);
        }
        Ok(())
    }

    /// Forget a document. Later references reload it from storage.
    pub fn close(&mut self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Default for DocumentManager {
    fn default() -> Self {
        Self::new(FileSystem)
    }
}

/// Map a document URI to the storage path it names.
pub fn resolve_path(uri: &Url) -> Result<PathBuf> {
    if uri.scheme() == "file" {
        return uri
            .to_file_path()
            .map_err(|_| Error::InvalidUri(uri.to_string()));
    }

    urlencoding::decode(uri.path())
        .map(|path| PathBuf::from(path.into_owned()))
        .map_err(|_| Error::InvalidUri(uri.to_string()))
}

fn load(source: &dyn DocumentSource, uri: &Url) -> Result<String> {
    let path = resolve_path(uri)?;
    log::debug!("Loading file {}", path.display());
    source
        .read(&path)
        .map_err(|source| Error::NotFound { path, source })
}
