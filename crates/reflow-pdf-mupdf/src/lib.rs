use std::path::Path;

use mupdf::{Document, Page, Quad, TextPageFlags};

use reflow_core::text::{expand_ligatures, strip_invisible};
use reflow_core::{BoundingBox, DocumentBackend, ExtractionError, PageLayout, PageSource, Word};

/// MuPDF-based implementation of [`DocumentBackend`] for PDF files.
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency so
/// that builds without the `pdf` feature do not transitively depend on it.
///
/// Every page is returned as [`PageSource::Positioned`] with word boxes in
/// page points relative to the page's top-left corner. A page whose geometry
/// cannot be read falls back to plain lines for that page only.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }

    /// Word geometry of every page that could be laid out.
    pub fn page_layouts(&self, path: &Path) -> Result<Vec<PageLayout>, ExtractionError> {
        Ok(self
            .read_pages(path)?
            .into_iter()
            .filter_map(|source| match source {
                PageSource::Positioned(layout) => Some(layout),
                PageSource::Lines(_) => None,
            })
            .collect())
    }
}

impl DocumentBackend for MupdfBackend {
    fn name(&self) -> &str {
        "mupdf"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["pdf"]
    }

    fn read_pages(&self, path: &Path) -> Result<Vec<PageSource>, ExtractionError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| ExtractionError::Open("invalid path encoding".into()))?;

        let document = Document::open(path_str).map_err(|e| ExtractionError::Open(e.to_string()))?;

        let mut sources = Vec::new();
        for (idx, page_result) in document
            .pages()
            .map_err(|e| ExtractionError::Read(e.to_string()))?
            .enumerate()
        {
            let number = idx + 1;
            let page = page_result.map_err(|e| ExtractionError::Read(e.to_string()))?;
            match page_layout(&page, number) {
                Ok(layout) => sources.push(PageSource::Positioned(layout)),
                Err(e) => {
                    tracing::warn!(page = number, error = %e, "page layout unreadable, using plain text");
                    sources.push(PageSource::Lines(plain_lines(&page)));
                }
            }
        }

        tracing::debug!(path = %path.display(), pages = sources.len(), "pdf read");
        Ok(sources)
    }
}

fn page_layout(page: &Page, number: usize) -> Result<PageLayout, mupdf::Error> {
    let bounds = page.bounds()?;
    let text_page = page.to_text_page(TextPageFlags::empty())?;

    let mut words = Vec::new();
    for block in text_page.blocks() {
        for line in block.lines() {
            let mut builder = WordBuilder::new(bounds.x0, bounds.y0);
            for c in line.chars() {
                builder.push(c.char().unwrap_or('\u{FFFD}'), c.quad());
            }
            words.extend(builder.finish());
        }
    }

    Ok(PageLayout {
        number,
        width: bounds.x1 - bounds.x0,
        height: bounds.y1 - bounds.y0,
        words,
    })
}

/// Lines of MuPDF's own text rendering of the page, for pages without usable geometry.
fn plain_lines(page: &Page) -> Vec<String> {
    match page.to_text() {
        Ok(text) => text
            .lines()
            .map(|l| expand_ligatures(&strip_invisible(l)))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "page text unreadable, page skipped");
            Vec::new()
        }
    }
}

/// Groups the characters of one text line into words, splitting on whitespace.
struct WordBuilder {
    origin_x: f32,
    origin_y: f32,
    words: Vec<Word>,
    text: String,
    bbox: Option<BoundingBox>,
}

impl WordBuilder {
    fn new(origin_x: f32, origin_y: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            words: Vec::new(),
            text: String::new(),
            bbox: None,
        }
    }

    fn push(&mut self, c: char, quad: Quad) {
        self.push_box(c, quad_box(&quad, self.origin_x, self.origin_y));
    }

    fn push_box(&mut self, c: char, char_box: BoundingBox) {
        if c.is_whitespace() {
            self.close_word();
            return;
        }
        self.text.push(c);
        self.bbox = Some(match self.bbox {
            Some(b) => b.union(&char_box),
            None => char_box,
        });
    }

    fn close_word(&mut self) {
        let text = expand_ligatures(&strip_invisible(&std::mem::take(&mut self.text)));
        if let Some(bbox) = self.bbox.take() {
            if !text.trim().is_empty() {
                self.words.push(Word::new(text.trim(), bbox));
            }
        }
    }

    fn finish(mut self) -> Vec<Word> {
        self.close_word();
        self.words
    }
}

/// Axis-aligned box around a (possibly rotated) character quad, relative to
/// the page origin.
fn quad_box(quad: &Quad, origin_x: f32, origin_y: f32) -> BoundingBox {
    let xs = [quad.ul.x, quad.ur.x, quad.ll.x, quad.lr.x];
    let ys = [quad.ul.y, quad.ur.y, quad.ll.y, quad.lr.y];
    let min = |v: [f32; 4]| v.into_iter().fold(f32::INFINITY, f32::min);
    let max = |v: [f32; 4]| v.into_iter().fold(f32::NEG_INFINITY, f32::max);
    BoundingBox::new(
        min(xs) - origin_x,
        min(ys) - origin_y,
        max(xs) - origin_x,
        max(ys) - origin_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_box(x: f32) -> BoundingBox {
        BoundingBox::new(x, 100.0, x + 5.0, 110.0)
    }

    #[test]
    fn test_backend_identity() {
        let backend = MupdfBackend::new();
        assert_eq!(backend.name(), "mupdf");
        assert!(backend.is_available());
        assert!(backend.supports(Path::new("paper.PDF")));
        assert!(!backend.supports(Path::new("paper.docx")));
    }

    #[test]
    fn test_words_split_on_whitespace() {
        let mut builder = WordBuilder::new(0.0, 0.0);
        for (i, c) in "ab  cd".chars().enumerate() {
            builder.push_box(c, char_box(i as f32 * 5.0));
        }
        let words = builder.finish();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "ab");
        assert_eq!(words[0].bbox, BoundingBox::new(0.0, 100.0, 10.0, 110.0));
        assert_eq!(words[1].text, "cd");
        assert_eq!(words[1].bbox.x0, 20.0);
    }

    #[test]
    fn test_ligatures_expanded() {
        let mut builder = WordBuilder::new(0.0, 0.0);
        builder.push_box('\u{FB01}', char_box(0.0));
        builder.push_box('x', char_box(5.0));
        let words = builder.finish();
        assert_eq!(words[0].text, "fix");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let result = MupdfBackend::new().read_pages(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(ExtractionError::Open(_))));
    }
}
