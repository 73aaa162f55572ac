//! End-to-end properties of the reconstruction pipeline.
//!
//! Each test drives the public API only, the way a host application would.

use reflow_parsing::{
    BoundingBox, DocumentConverter, PageLayout, PageSource, ParsingConfig, Word,
    filter_headers_footers, merge_lines_into_paragraphs, normalize_references_block,
    normalize_spaces, reorder_page, score_entries,
};

fn lines(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Whitespace normalization
// =============================================================================

#[test]
fn normalize_spaces_is_idempotent() {
    for s in ["  a\t b \n c  ", "", "single", "Иванов   И.И.\u{2003}Текст"] {
        let once = normalize_spaces(s);
        assert_eq!(normalize_spaces(&once), once);
    }
}

// =============================================================================
// Paragraph conservation and section isolation
// =============================================================================

#[test]
fn every_line_survives_merging() {
    let input = lines(&[
        "ИНСТИТУТ СЛАВЯНОВЕДЕНИЯ РАН",
        "Original Article / Оригинальная статья",
        "Для цитирования: Иванов И.И. Статья // Журнал. 2020.",
        "В статье рассматриваются вопросы истории",
        "славянских языков в XIX веке.",
        "Ключевые слова: история, язык, диалект",
        "Abstract. The article deals with the history",
        "of Slavic languages.",
        "e-mail: ivanov@inslav.ru",
    ]);
    let paragraphs = merge_lines_into_paragraphs(&input);
    assert!(!paragraphs.is_empty());

    let joined = paragraphs.join(" ");
    for line in &input {
        assert!(joined.contains(&normalize_spaces(line)), "lost line: {line}");
    }
}

#[test]
fn section_heads_stand_alone() {
    let input = lines(&[
        "Текст перед аннотацией без точки и",
        "Аннотация. Краткое содержание статьи.",
        "Keywords: syntax, morphology",
        "и продолжение текста после ключевых слов",
    ]);
    let paragraphs = merge_lines_into_paragraphs(&input);
    assert!(paragraphs.contains(&"Аннотация. Краткое содержание статьи.".to_string()));
    assert!(paragraphs.contains(&"Keywords: syntax, morphology".to_string()));
    assert!(
        !paragraphs
            .iter()
            .any(|p| p.contains("Аннотация") && p.contains("Текст перед"))
    );
}

#[test]
fn non_empty_input_yields_a_paragraph() {
    assert_eq!(merge_lines_into_paragraphs(&lines(&["x"])), vec!["x"]);
}

// =============================================================================
// Header/footer filtering
// =============================================================================

#[test]
fn page_numbers_collapse_to_one_line() {
    let pages: Vec<Vec<String>> = (1..=5)
        .map(|n| {
            vec![
                format!("Body text of page {n} with enough words"),
                "middle of the page".to_string(),
                format!("Page {n}"),
            ]
        })
        .collect();
    let out = filter_headers_footers(&pages);
    let numbers = out.iter().filter(|l| l.starts_with("Page ")).count();
    assert_eq!(numbers, 1);
}

// =============================================================================
// Bibliography
// =============================================================================

#[test]
fn bibliography_boundary() {
    let input = lines(&[
        "Preface text that must not leak into the list.",
        "REFERENCES",
        "1. Smith J. Title. 2001. P. 10-20.",
        "2. Ivanov A. Заголовок. 2005.",
        "Received 2020-01-01",
    ]);
    let (entries, score) = normalize_references_block(&input);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| !e.contains("Received")));
    assert!(entries.iter().all(|e| !e.contains("Preface")));
    assert!((0.0..=1.0).contains(&score));
}

#[test]
fn score_is_bounded() {
    assert_eq!(score_entries(&[]), 0.0);
    let samples = [
        lines(&["x"]),
        lines(&["https://a.org/ b c", "1999"]),
        lines(&["Author A. Title. 2001. P. 1-2. DOI: 10.1/2"]),
    ];
    for entries in samples {
        let s = score_entries(&entries);
        assert!((0.0..=1.0).contains(&s), "{s}");
    }
}

// =============================================================================
// Column reordering
// =============================================================================

fn two_column_page() -> PageLayout {
    let mut words = Vec::new();
    for row in 0..12 {
        let top = 100.0 + row as f32 * 15.0;
        words.push(Word::new(format!("R{row}"), BoundingBox::new(330.0, top, 380.0, top + 10.0)));
        words.push(Word::new(format!("L{row}"), BoundingBox::new(60.0, top, 110.0, top + 10.0)));
    }
    PageLayout {
        number: 1,
        width: 595.0,
        height: 842.0,
        words,
    }
}

#[test]
fn column_reordering_is_deterministic() {
    let page = two_column_page();
    let config = ParsingConfig::default();
    let first = reorder_page(&page, &config);
    for _ in 0..5 {
        assert_eq!(reorder_page(&page, &config), first);
    }
    assert_eq!(first.first().map(String::as_str), Some("L0"));
    assert_eq!(first.get(12).map(String::as_str), Some("R0"));
}

#[test]
fn converter_accepts_mixed_sources() {
    let sources = vec![
        PageSource::Positioned(two_column_page()),
        PageSource::Lines(lines(&["Plain page text without geometry."])),
    ];
    let conversion = DocumentConverter::new().convert_sources(&sources);
    assert!(conversion.paragraphs.iter().any(|p| p.contains("Plain page text")));
    assert!(conversion.html.contains("<p>"));
}
