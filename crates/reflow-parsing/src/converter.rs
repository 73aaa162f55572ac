use std::fmt;

use reflow_core::{Page, PageSource};
use serde::Serialize;

use crate::bibliography::{NormalizedReferences, normalize_references};
use crate::columns::pages_in_reading_order;
use crate::config::ParsingConfig;
use crate::header_footer::{filter_headers_footers_with_config, is_service_line};
use crate::html::paragraphs_to_html;
use crate::paragraph::merge_lines_into_paragraphs_with_config;

/// Advisory conditions met while converting; none of them stop the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionWarning {
    /// Too few pages for cross-page frequency analysis; nothing was filtered.
    FilterDegraded { pages: usize },
    /// No references header was found.
    ReferencesNotFound,
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionWarning::FilterDegraded { pages } => write!(
                f,
                "header/footer filtering skipped: {pages} page(s), at least 2 needed"
            ),
            ConversionWarning::ReferencesNotFound => write!(f, "no references block found"),
        }
    }
}

/// Everything produced for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub paragraphs: Vec<String>,
    pub html: String,
    pub references: Option<NormalizedReferences>,
    pub warnings: Vec<ConversionWarning>,
}

/// A configurable line-to-paragraph pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each stage as a method; the
/// `convert_*` methods run the whole chain.
pub struct DocumentConverter {
    config: ParsingConfig,
}

impl Default for DocumentConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConverter {
    pub fn new() -> Self {
        Self {
            config: ParsingConfig::default(),
        }
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Lines of each page in reading order (step 1).
    pub fn reading_order(&self, sources: &[PageSource]) -> Vec<Page> {
        pages_in_reading_order(sources, &self.config)
    }

    /// Drop running titles and page numbers, flattening the pages (step 2).
    pub fn filter_headers_footers(&self, pages: &[Page]) -> Vec<String> {
        let lines = filter_headers_footers_with_config(pages, &self.config);
        if !self.config.drop_service_lines() {
            return lines;
        }
        // blank lines are paragraph breaks, not service lines
        lines
            .into_iter()
            .filter(|l| l.trim().is_empty() || !is_service_line(l))
            .collect()
    }

    /// Rebuild paragraphs from flat lines (step 3).
    pub fn merge_paragraphs(&self, lines: &[String]) -> Vec<String> {
        merge_lines_into_paragraphs_with_config(lines, &self.config)
    }

    /// Rebuild the references block from flat lines (step 4).
    pub fn normalize_references(&self, lines: &[String]) -> Option<NormalizedReferences> {
        normalize_references(lines, &self.config)
    }

    /// Render paragraphs as HTML (step 5).
    pub fn to_html(&self, paragraphs: &[String]) -> String {
        paragraphs_to_html(paragraphs)
    }

    /// Run the pipeline on pages of extracted lines.
    pub fn convert_pages(&self, pages: &[Page]) -> Conversion {
        let mut warnings = Vec::new();
        if pages.len() < 2 {
            warnings.push(ConversionWarning::FilterDegraded { pages: pages.len() });
        }

        let lines = self.filter_headers_footers(pages);
        let paragraphs = self.merge_paragraphs(&lines);
        let references = self.normalize_references(&lines);
        if references.is_none() {
            warnings.push(ConversionWarning::ReferencesNotFound);
        }
        let html = self.to_html(&paragraphs);

        tracing::debug!(
            pages = pages.len(),
            lines = lines.len(),
            paragraphs = paragraphs.len(),
            references = references.as_ref().map_or(0, |r| r.entries.len()),
            "document converted"
        );

        Conversion {
            paragraphs,
            html,
            references,
            warnings,
        }
    }

    /// Run the pipeline on backend output, reordering positioned pages first.
    pub fn convert_sources(&self, sources: &[PageSource]) -> Conversion {
        let pages = self.reading_order(sources);
        self.convert_pages(&pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsingConfigBuilder;

    fn page(lines: &[&str]) -> Page {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_page_warns() {
        let conversion = DocumentConverter::new().convert_pages(&[page(&["Одна строка текста статьи."])]);
        assert_eq!(
            conversion.warnings,
            vec![
                ConversionWarning::FilterDegraded { pages: 1 },
                ConversionWarning::ReferencesNotFound
            ]
        );
        assert_eq!(conversion.html, "<p>Одна строка текста статьи.</p>");
    }

    #[test]
    fn test_full_pipeline() {
        let pages = vec![
            page(&[
                "Вестник славяноведения",
                "Аннотация. Статья о языке.",
                "Основной текст статьи начинается здесь и",
                "продолжается на следующей строке.",
                "1",
            ]),
            page(&[
                "Вестник славяноведения",
                "Второй абзац статьи содержит важные выводы автора.",
                "2",
            ]),
            page(&[
                "Вестник славяноведения",
                "Список литературы",
                "1. Иванов И.И. История языка. М., 2001. С. 1–10.",
                "2. Smith J. Slavic studies. London, 1999. P. 5-9.",
                "3",
            ]),
        ];
        let conversion = DocumentConverter::new().convert_pages(&pages);

        assert!(conversion.warnings.is_empty());
        assert!(!conversion.paragraphs.iter().any(|p| p.contains("Вестник")));
        assert_eq!(conversion.paragraphs[0], "Аннотация. Статья о языке.");
        assert_eq!(
            conversion.paragraphs[1],
            "Основной текст статьи начинается здесь и продолжается на следующей строке."
        );
        let refs = conversion.references.unwrap();
        assert_eq!(refs.entries.len(), 2);
        assert!(refs.score > 0.9);
        assert!(conversion.html.starts_with("<p>Аннотация."));
    }

    #[test]
    fn test_service_lines_dropped_when_enabled() {
        let config = ParsingConfigBuilder::new().drop_service_lines(true).build().unwrap();
        let converter = DocumentConverter::with_config(config);
        let lines = converter.filter_headers_footers(&[page(&["УДК 81.2", "", "Текст статьи."])]);
        assert_eq!(lines, vec!["", "Текст статьи."]);
    }

    #[test]
    fn test_doi_after_references_head_stays_standalone() {
        let converter = DocumentConverter::new();
        let lines = page(&[
            "Список литературы",
            "",
            "1. Иванов И.И. Заголовок статьи. 2001.",
            "",
            "DOI: 10.1000/ABC",
        ]);
        let paragraphs = converter.merge_paragraphs(&lines);
        assert_eq!(
            paragraphs,
            vec![
                "Список литературы",
                "1. Иванов И.И. Заголовок статьи. 2001.",
                "DOI: 10.1000/ABC"
            ]
        );
    }

    #[test]
    fn test_conversion_serializes_to_json() -> anyhow::Result<()> {
        let conversion = DocumentConverter::new().convert_pages(&[page(&["Одна строка текста статьи."])]);
        let value = serde_json::to_value(&conversion)?;

        assert_eq!(value["paragraphs"], serde_json::json!(["Одна строка текста статьи."]));
        assert!(value["references"].is_null());
        assert_eq!(
            value["warnings"],
            serde_json::json!([
                { "kind": "filter_degraded", "pages": 1 },
                { "kind": "references_not_found" }
            ])
        );
        Ok(())
    }
}
