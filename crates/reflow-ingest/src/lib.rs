use std::path::Path;

use reflow_core::backend::extension_of;
use thiserror::Error;

pub mod docx;
pub mod flow;
pub mod registry;
pub mod rtf;

pub use docx::DocxBackend;
pub use flow::{FlowOptions, merge_doi_url_lines};
pub use registry::{BackendRegistry, UnavailableBackend, default_registry};
pub use rtf::RtfBackend;
// Re-export domain types for convenience
pub use reflow_core::{BackendInfo, DocumentBackend, ExtractionError, Margins, Page, PageSource, TextBlockMatch};

use reflow_parsing::{Conversion, DocumentConverter, ParsingConfig, pages_in_reading_order};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of reflow-ingest)")]
    NoPdfSupport,
}

/// Read a document into backend page sources using the default registry.
///
/// The backend is chosen by file extension:
/// - `.pdf` → MuPDF (requires `pdf` feature)
/// - `.docx` → zip + WordprocessingML reader
/// - `.rtf` → control-word stripper
pub fn extract_sources(path: &Path) -> Result<Vec<PageSource>, IngestError> {
    extract_sources_with(path, &default_registry(), None)
}

/// Read a document through `registry`, honouring a preferred backend name.
pub fn extract_sources_with(
    path: &Path,
    registry: &BackendRegistry,
    prefer: Option<&str>,
) -> Result<Vec<PageSource>, IngestError> {
    Ok(registry.read_pages(path, prefer)?)
}

/// Extract the lines of every page, in reading order.
///
/// Positioned pages are reordered column by column; flow formats produce a
/// single page.
pub fn extract_pages(path: &Path) -> Result<Vec<Page>, IngestError> {
    let sources = extract_sources(path)?;
    Ok(pages_in_reading_order(&sources, &ParsingConfig::default()))
}

/// Read and convert one document with the default registry.
pub fn convert_document(path: &Path, converter: &DocumentConverter) -> Result<Conversion, IngestError> {
    convert_document_with(path, converter, &default_registry(), None)
}

pub fn convert_document_with(
    path: &Path,
    converter: &DocumentConverter,
    registry: &BackendRegistry,
    prefer: Option<&str>,
) -> Result<Conversion, IngestError> {
    let sources = extract_sources_with(path, registry, prefer)?;
    let conversion = converter.convert_sources(&sources);
    for warning in &conversion.warnings {
        tracing::debug!(path = %path.display(), %warning, "conversion warning");
    }
    Ok(conversion)
}

/// Locate labelled blocks in a PDF by word geometry.
///
/// Only PDF carries geometry; other formats fail with `Unsupported`.
pub fn find_blocks(
    path: &Path,
    terms: &[String],
    expand: Margins,
    config: &ParsingConfig,
) -> Result<Vec<TextBlockMatch>, IngestError> {
    ensure_pdf(path)?;
    let layouts = pdf_layouts(path)?;
    Ok(reflow_parsing::find_text_blocks_with_config(&layouts, terms, expand, config))
}

/// The first abstract-like block of a PDF, if any.
pub fn find_annotation(path: &Path, config: &ParsingConfig) -> Result<Option<TextBlockMatch>, IngestError> {
    ensure_pdf(path)?;
    let layouts = pdf_layouts(path)?;
    Ok(reflow_parsing::find_annotation_block_with_config(&layouts, config))
}

fn ensure_pdf(path: &Path) -> Result<(), ExtractionError> {
    let ext = extension_of(path);
    if ext == "pdf" {
        Ok(())
    } else {
        Err(ExtractionError::Unsupported(format!(
            "{}: block lookup needs page geometry (PDF only)",
            path.display()
        )))
    }
}

#[cfg(feature = "pdf")]
fn pdf_layouts(path: &Path) -> Result<Vec<reflow_core::PageLayout>, IngestError> {
    Ok(reflow_pdf_mupdf::MupdfBackend::new().page_layouts(path)?)
}

#[cfg(not(feature = "pdf"))]
fn pdf_layouts(_path: &Path) -> Result<Vec<reflow_core::PageLayout>, IngestError> {
    Err(IngestError::NoPdfSupport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_lookup_rejects_flow_formats() {
        let err = find_blocks(
            Path::new("paper.docx"),
            &["Abstract".to_string()],
            Margins::ZERO,
            &ParsingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::Extraction(ExtractionError::Unsupported(_))));
    }

    #[test]
    fn test_missing_document_fails() {
        let err = extract_pages(Path::new("/nonexistent/paper.docx")).unwrap_err();
        assert!(matches!(err, IngestError::Extraction(ExtractionError::Open(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = extract_sources(Path::new("notes.odt")).unwrap_err();
        assert_eq!(err.to_string(), "unsupported document format: .odt");
    }
}
