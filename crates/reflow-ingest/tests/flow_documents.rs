//! DOCX and RTF documents read end to end through the default registry.

use std::io::Write;
use std::path::{Path, PathBuf};

use reflow_ingest::{IngestError, PageSource, convert_document, extract_pages, extract_sources};
use reflow_parsing::{DocumentConverter, ParsingConfigBuilder};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
const DOCUMENT_CLOSE: &str = "</w:body></w:document>";

fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

fn part(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| paragraph(p)).collect();
    format!("{DOCUMENT_OPEN}{body}{DOCUMENT_CLOSE}")
}

fn write_docx(dir: &TempDir, name: &str, parts: &[(&str, String)]) -> anyhow::Result<PathBuf> {
    let path = dir.path().join(name);
    let file = std::fs::File::create(&path)?;
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("[Content_Types].xml", SimpleFileOptions::default())?;
    zip.write_all(br#"<?xml version="1.0"?><Types/>"#)?;
    for (name, xml) in parts {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(xml.as_bytes())?;
    }
    zip.finish()?;
    Ok(path)
}

fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}

fn only_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let mut sources = extract_sources(path)?;
    assert_eq!(sources.len(), 1);
    match sources.remove(0) {
        PageSource::Lines(lines) => Ok(lines),
        PageSource::Positioned(_) => anyhow::bail!("flow document produced geometry"),
    }
}

// =============================================================================
// DOCX
// =============================================================================

#[test]
fn docx_parts_read_in_sorted_order() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_docx(
        &dir,
        "article.docx",
        &[
            ("word/header1.xml", part(&["Running header"])),
            ("word/document.xml", part(&["Body paragraph.", "Second paragraph."])),
            ("word/footnotes.xml", part(&["A footnote."])),
            ("word/styles.xml", part(&["Not text"])),
        ],
    )?;

    let lines = only_lines(&path)?;
    assert_eq!(
        lines,
        vec!["Body paragraph.", "", "Second paragraph.", "", "A footnote.", "", "Running header"]
    );
    Ok(())
}

#[test]
fn docx_doi_link_joins_reference() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_docx(
        &dir,
        "refs.docx",
        &[(
            "word/document.xml",
            part(&[
                "Polyanin A.D. Handbook of integral equations. 2008.",
                "https://doi.org/10.1201/9781420010558",
            ]),
        )],
    )?;

    let lines = only_lines(&path)?;
    assert_eq!(
        lines,
        vec!["Polyanin A.D. Handbook of integral equations. 2008. https://doi.org/10.1201/9781420010558"]
    );
    Ok(())
}

#[test]
fn docx_without_document_part_fails() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_docx(&dir, "broken.docx", &[("word/header1.xml", part(&["x"]))])?;
    assert!(matches!(extract_sources(&path), Err(IngestError::Extraction(_))));
    Ok(())
}

#[test]
fn non_zip_docx_fails_to_open() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "fake.docx", b"plain text, not a zip")?;
    let err = extract_pages(&path).unwrap_err();
    assert!(err.to_string().starts_with("failed to open document"));
    Ok(())
}

#[test]
fn docx_converts_to_paragraphs() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_docx(
        &dir,
        "paper.docx",
        &[(
            "word/document.xml",
            part(&[
                "УДК 81.2",
                "Аннотация. Статья посвящена истории языка.",
                "Список литературы",
                "1. Иванов И.И. История языка. М., 2001. С. 1–10.",
                "2. Smith J. Slavic studies. London, 1999. P. 5-9.",
            ]),
        )],
    )?;

    let config = ParsingConfigBuilder::new().drop_service_lines(true).build()?;
    let conversion = convert_document(&path, &DocumentConverter::with_config(config))?;

    assert!(!conversion.paragraphs.iter().any(|p| p.contains("УДК")));
    assert_eq!(conversion.paragraphs[0], "Аннотация. Статья посвящена истории языка.");
    let references = conversion.references.expect("references block");
    assert_eq!(references.entries.len(), 2);
    assert!(conversion.html.starts_with("<p>Аннотация."));
    Ok(())
}

#[test]
fn docx_paragraph_boundaries_survive_conversion() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_docx(
        &dir,
        "two.docx",
        &[(
            "word/document.xml",
            part(&["Первый абзац документа без точки", "второй абзац документа."]),
        )],
    )?;

    let conversion = convert_document(&path, &DocumentConverter::new())?;
    assert_eq!(
        conversion.paragraphs,
        vec!["Первый абзац документа без точки", "второй абзац документа."]
    );
    Ok(())
}

// =============================================================================
// RTF
// =============================================================================

#[test]
fn rtf_cyrillic_lines() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let rtf = br"{\rtf1\ansi\ansicpg1251{\fonttbl{\f0 Times New Roman;}}
\f0 \'cf\'e5\'f0\'e2\'e0\'ff \'f1\'f2\'f0\'ee\'EA\'e0\par
Second line\par
\par
}";
    let path = write_file(&dir, "note.rtf", rtf)?;
    let lines = only_lines(&path)?;
    assert_eq!(lines, vec!["Первая строка", "", "Second line"]);
    Ok(())
}

#[test]
fn rtf_without_header_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "plain.rtf", b"just text")?;
    assert!(extract_pages(&path).is_err());
    Ok(())
}

#[test]
fn pages_of_flow_document() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_file(&dir, "two.rtf", br"{\rtf1 one\par two}")?;
    assert_eq!(
        extract_pages(&path)?,
        vec![vec!["one".to_string(), String::new(), "two".to_string()]]
    );
    Ok(())
}
