//! Splitting a single extracted line into semantic parts.
//!
//! Section heads (Abstract, Keywords, citation line, References) cut the line
//! and keep everything from the head to the end of the line as one part.
//! Inline tokens (e-mail, URL, DOI, article type) are lifted out of the
//! surrounding prose without breaking the prose itself.

use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) const ARTICLE_TYPE: &str = r"(?:Оригинальная\s+статья|Original\s+Article|Обзорная\s+статья|Review\s+Article|Краткое\s+сообщение|Short\s+Message)";

pub(crate) static ANNOTATION_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:Аннотация|Abstract)\.?\s*").unwrap());
pub(crate) static KEYWORDS_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:Ключевые\s+слова|Keywords)\s*[.:]?\s*").unwrap());
pub(crate) static CITATION_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:For\s+citation|Для\s+цитирования):\s*").unwrap());
pub(crate) static REFERENCES_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:Источники|Литература|References|Список\s+литературы|Bibliography|Библиография)(?:\s*и\s+источники)?[.:]?\s*",
    )
    .unwrap()
});

pub(crate) static ARTICLE_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i){ARTICLE_TYPE}(?:\s*/\s*{ARTICLE_TYPE})?")).unwrap()
});
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+").unwrap());
static DOI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)DOI:\s*[0-9]+\.[0-9]+/[A-Z0-9\-]+").unwrap());

/// Which section a head segment opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Abstract,
    Keywords,
    Citation,
    References,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Email,
    Url,
    Doi,
    ArticleType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Token(TokenKind),
    /// Head of a section plus the rest of its line.
    SectionHead(SectionKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub kind: SegmentKind,
}

impl Segment {
    fn new(text: &str, kind: SegmentKind) -> Self {
        Self {
            text: text.trim().to_string(),
            kind,
        }
    }

    /// Abstract and Keywords heads always stand alone as paragraphs.
    pub fn is_isolated_head(&self) -> bool {
        matches!(
            self.kind,
            SegmentKind::SectionHead(SectionKind::Abstract | SectionKind::Keywords)
        )
    }
}

/// Heads in priority order.
fn section_heads() -> [(SectionKind, &'static Regex); 4] {
    [
        (SectionKind::Abstract, &*ANNOTATION_HEAD),
        (SectionKind::Keywords, &*KEYWORDS_HEAD),
        (SectionKind::Citation, &*CITATION_HEAD),
        (SectionKind::References, &*REFERENCES_HEAD),
    ]
}

/// Split a line into ordered, non-empty, trimmed parts.
pub fn segment_line(line: &str) -> Vec<String> {
    segment_line_typed(line).into_iter().map(|s| s.text).collect()
}

/// Like [`segment_line`], keeping what each part was recognized as.
pub fn segment_line_typed(line: &str) -> Vec<Segment> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }

    for (kind, head) in section_heads() {
        if let Some(m) = head.find(line) {
            let mut parts = segment_line_typed(&line[..m.start()]);
            parts.push(Segment::new(&line[m.start()..], SegmentKind::SectionHead(kind)));
            parts.retain(|p| !p.text.is_empty());
            return parts;
        }
    }

    let spans = find_inline_tokens(line);
    if spans.is_empty() {
        return vec![Segment::new(line, SegmentKind::Text)];
    }

    let mut parts = Vec::new();
    let mut cursor = 0;
    for (start, end, kind) in spans {
        let before = line[cursor..start].trim();
        if !before.is_empty() {
            parts.push(Segment::new(before, SegmentKind::Text));
        }
        parts.push(Segment::new(&line[start..end], SegmentKind::Token(kind)));
        cursor = end;
    }
    let after = line[cursor..].trim();
    if !after.is_empty() {
        parts.push(Segment::new(after, SegmentKind::Text));
    }
    parts.retain(|p| !p.text.is_empty());
    parts
}

/// Non-overlapping inline token spans `(start, end, kind)`, ordered by start.
///
/// Overlaps resolve to the earliest start, then the longest match.
fn find_inline_tokens(line: &str) -> Vec<(usize, usize, TokenKind)> {
    let patterns: [(&Regex, TokenKind); 4] = [
        (&*EMAIL, TokenKind::Email),
        (&*URL, TokenKind::Url),
        (&*DOI, TokenKind::Doi),
        (&*ARTICLE_TYPE_RE, TokenKind::ArticleType),
    ];

    let mut spans: Vec<(usize, usize, TokenKind)> = patterns
        .iter()
        .flat_map(|(re, kind)| re.find_iter(line).map(move |m| (m.start(), m.end(), *kind)))
        .collect();
    spans.sort_by(|a, b| a.0.cmp(&b.0).then((b.1 - b.0).cmp(&(a.1 - a.0))));

    let mut kept = Vec::with_capacity(spans.len());
    let mut last_end = 0;
    for span in spans {
        if !kept.is_empty() && span.0 < last_end {
            continue;
        }
        last_end = span.1;
        kept.push(span);
    }
    kept
}
