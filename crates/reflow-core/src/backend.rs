use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::PageSource;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no extraction backend available for {0}")]
    NoBackend(String),
    #[error("unsupported document format: {0}")]
    Unsupported(String),
    #[error("failed to open document: {0}")]
    Open(String),
    #[error("failed to read document content: {0}")]
    Read(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A source of page content for one or more document formats.
///
/// Backends are registered with a registry and queried at runtime rather
/// than discovered at link time; a backend whose library is compiled out
/// still registers and reports `is_available() == false`.
pub trait DocumentBackend: Send + Sync {
    /// Short stable name used for selection (`"mupdf"`, `"docx"`, ...).
    fn name(&self) -> &str;

    /// Whether the backend can actually run in this build.
    fn is_available(&self) -> bool {
        true
    }

    /// Lowercase file extensions this backend reads, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether this backend handles the given file.
    fn supports(&self, path: &Path) -> bool {
        let ext = extension_of(path);
        self.extensions().iter().any(|e| *e == ext)
    }

    /// Read every page of the document in document order.
    fn read_pages(&self, path: &Path) -> Result<Vec<PageSource>, ExtractionError>;

    fn info(&self) -> BackendInfo {
        BackendInfo {
            name: self.name().to_string(),
            available: self.is_available(),
            extensions: self.extensions().iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Snapshot of a backend's registration, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    pub name: String,
    pub available: bool,
    pub extensions: Vec<String>,
}

/// Lowercased extension of `path`, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
