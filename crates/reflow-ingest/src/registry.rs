use std::path::Path;

use reflow_core::backend::extension_of;
use reflow_core::{BackendInfo, DocumentBackend, ExtractionError, PageSource};

use crate::docx::DocxBackend;
use crate::rtf::RtfBackend;

/// The set of document backends known to this build, in priority order.
///
/// Backends whose library is compiled out stay registered but report
/// themselves unavailable, so hosts can list what a full build would offer.
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Box<dyn DocumentBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, backend: impl DocumentBackend + 'static) {
        tracing::debug!(backend = backend.name(), available = backend.is_available(), "backend registered");
        self.backends.push(Box::new(backend));
    }

    pub fn backends(&self) -> impl Iterator<Item = &dyn DocumentBackend> {
        self.backends.iter().map(|b| b.as_ref())
    }

    pub fn infos(&self) -> Vec<BackendInfo> {
        self.backends().map(|b| b.info()).collect()
    }

    /// Pick the backend for `path`.
    ///
    /// A backend named by `prefer` wins when it is available and handles the
    /// file; otherwise the first available backend for the extension is used.
    /// Fails with `Unsupported` when no registered backend handles the
    /// extension and `NoBackend` when the ones that do are unavailable.
    pub fn select(&self, path: &Path, prefer: Option<&str>) -> Result<&dyn DocumentBackend, ExtractionError> {
        let candidates: Vec<&dyn DocumentBackend> = self.backends().filter(|b| b.supports(path)).collect();
        if candidates.is_empty() {
            let ext = extension_of(path);
            return Err(ExtractionError::Unsupported(if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{ext}")
            }));
        }

        if let Some(name) = prefer {
            match candidates.iter().find(|b| b.name() == name) {
                Some(b) if b.is_available() => return Ok(*b),
                Some(_) => tracing::warn!(backend = name, "preferred backend unavailable, falling back"),
                None => tracing::debug!(backend = name, path = %path.display(), "preferred backend does not handle file"),
            }
        }

        candidates
            .into_iter()
            .find(|b| b.is_available())
            .ok_or_else(|| ExtractionError::NoBackend(path.display().to_string()))
    }

    /// Read `path` with the selected backend.
    pub fn read_pages(&self, path: &Path, prefer: Option<&str>) -> Result<Vec<PageSource>, ExtractionError> {
        let backend = self.select(path, prefer)?;
        tracing::debug!(backend = backend.name(), path = %path.display(), "reading document");
        backend.read_pages(path)
    }
}

/// A registration slot for a backend whose library is not compiled in.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableBackend {
    name: &'static str,
    extensions: &'static [&'static str],
}

impl UnavailableBackend {
    pub fn new(name: &'static str, extensions: &'static [&'static str]) -> Self {
        Self { name, extensions }
    }
}

impl DocumentBackend for UnavailableBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        false
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn read_pages(&self, path: &Path) -> Result<Vec<PageSource>, ExtractionError> {
        Err(ExtractionError::NoBackend(path.display().to_string()))
    }
}

/// Registry with every backend this build knows about: MuPDF for PDF
/// (unavailable without the `pdf` feature), then DOCX and RTF.
pub fn default_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    #[cfg(feature = "pdf")]
    registry.register(reflow_pdf_mupdf::MupdfBackend::new());
    #[cfg(not(feature = "pdf"))]
    registry.register(UnavailableBackend::new("mupdf", &["pdf"]));
    registry.register(DocxBackend::new());
    registry.register(RtfBackend::new());
    registry
}
