//! DOCX reader: paragraphs from the WordprocessingML parts of the zip package.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use reflow_core::{DocumentBackend, ExtractionError, PageSource};

use crate::flow::{FlowOptions, blocks_to_lines};

/// Reads `.docx` files as a single page of paragraph lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxBackend {
    options: FlowOptions,
}

impl DocxBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: FlowOptions) -> Self {
        Self { options }
    }
}

impl DocumentBackend for DocxBackend {
    fn name(&self) -> &str {
        "docx"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["docx"]
    }

    fn read_pages(&self, path: &Path) -> Result<Vec<PageSource>, ExtractionError> {
        let blocks = read_docx_paragraphs(path)?;
        let lines = blocks_to_lines(&blocks, self.options);
        tracing::debug!(path = %path.display(), blocks = blocks.len(), lines = lines.len(), "docx read");
        Ok(vec![PageSource::Lines(lines)])
    }
}

/// Whether a zip entry is a WordprocessingML part that carries body text.
fn is_text_part(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("word/") else {
        return false;
    };
    if !rest.ends_with(".xml") || rest.contains('/') {
        return false;
    }
    rest == "document.xml"
        || rest == "footnotes.xml"
        || rest == "endnotes.xml"
        || rest.starts_with("header")
        || rest.starts_with("footer")
}

/// Raw paragraph texts of every text part, parts in sorted name order.
pub fn read_docx_paragraphs(path: &Path) -> Result<Vec<String>, ExtractionError> {
    let file = File::open(path).map_err(|e| ExtractionError::Open(format!("{}: {e}", path.display())))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ExtractionError::Open(format!("{} is not a valid DOCX package: {e}", path.display())))?;

    let mut parts: Vec<String> = archive
        .file_names()
        .filter(|n| is_text_part(n))
        .map(str::to_string)
        .collect();
    parts.sort();
    if !parts.iter().any(|p| p == "word/document.xml") {
        return Err(ExtractionError::Read(format!(
            "{}: word/document.xml missing",
            path.display()
        )));
    }

    let mut paragraphs = Vec::new();
    for part in &parts {
        let mut entry = archive
            .by_name(part)
            .map_err(|e| ExtractionError::Read(format!("{part}: {e}")))?;
        let mut xml = Vec::new();
        entry.read_to_end(&mut xml)?;
        let found = paragraphs_from_xml(&xml).map_err(|e| ExtractionError::Read(format!("{part}: {e}")))?;
        tracing::debug!(part = %part, paragraphs = found.len(), "docx part parsed");
        paragraphs.extend(found);
    }
    Ok(paragraphs)
}

/// Text of every `w:p` element, with `w:tab` as a tab and `w:br`/`w:cr` as a
/// newline. Paragraphs without text are skipped.
pub fn paragraphs_from_xml(xml: &[u8]) -> Result<Vec<String>, quick_xml::Error> {
    let mut xml_reader = Reader::from_reader(xml);
    xml_reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_text = false;
    // tab stop definitions in paragraph properties are also named `w:tab`
    let mut in_tab_stops = false;

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"p" => {
                    if depth == 0 {
                        current.clear();
                    }
                    depth += 1;
                }
                b"t" => in_text = depth > 0,
                b"tabs" => in_tab_stops = true,
                b"tab" if depth > 0 && !in_tab_stops => current.push('\t'),
                b"br" | b"cr" if depth > 0 => current.push('\n'),
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"tab" if depth > 0 && !in_tab_stops => current.push('\t'),
                b"br" | b"cr" if depth > 0 => current.push('\n'),
                _ => {}
            },
            Event::Text(ref e) if in_text => {
                current.push_str(&e.unescape().unwrap_or_default());
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"tabs" => in_tab_stops = false,
                b"p" if depth > 0 => {
                    depth -= 1;
                    // nested paragraphs (text boxes) fold into the outer one
                    if depth == 0 && !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn body(inner: &str) -> Vec<u8> {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:document {NS}><w:body>{inner}</w:body></w:document>"#)
            .into_bytes()
    }

    #[test]
    fn test_runs_joined_per_paragraph() {
        let xml = body(
            r#"<w:p><w:r><w:t>Первая </w:t></w:r><w:r><w:t>строка</w:t></w:r></w:p>
               <w:p><w:r><w:t>Second &amp; last</w:t></w:r></w:p>"#,
        );
        let paragraphs = paragraphs_from_xml(&xml).unwrap();
        assert_eq!(paragraphs, vec!["Первая строка", "Second & last"]);
    }

    #[test]
    fn test_tab_and_break() {
        let xml = body(r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p>"#);
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["a\tb\nc"]);
    }

    #[test]
    fn test_tab_stops_are_not_text() {
        let xml = body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#,
        );
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["x"]);
    }

    #[test]
    fn test_empty_paragraphs_skipped() {
        let xml = body(r#"<w:p/><w:p><w:pPr/></w:p><w:p><w:r><w:t xml:space="preserve"> x </w:t></w:r></w:p>"#);
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec![" x "]);
    }

    #[test]
    fn test_text_outside_t_ignored() {
        let xml = body(r#"<w:p><w:r><w:instrText>PAGE</w:instrText><w:t>Body</w:t></w:r></w:p>"#);
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["Body"]);
    }

    #[test]
    fn test_text_part_selection() {
        assert!(is_text_part("word/document.xml"));
        assert!(is_text_part("word/header1.xml"));
        assert!(is_text_part("word/footer2.xml"));
        assert!(is_text_part("word/footnotes.xml"));
        assert!(!is_text_part("word/styles.xml"));
        assert!(!is_text_part("word/_rels/document.xml.rels"));
        assert!(!is_text_part("docProps/core.xml"));
    }
}
