//! Paragraph reconstruction from a flat list of lines.
//!
//! A two-state machine: `Empty` or `Accumulating` an open paragraph. Every
//! line is first cut into segments; each segment is then either isolated
//! (section heads, metadata), glued or merged into the open paragraph, or
//! used to open the next one according to [`crate::rules::JOIN_RULES`].

use once_cell::sync::Lazy;
use regex::Regex;
use reflow_core::normalize_spaces;
use reflow_core::text::char_len;

use crate::config::ParsingConfig;
use crate::rules::{JoinAction, JoinContext, decide_join, metadata_rule};
use crate::segment::{Segment, segment_line_typed};

static LINK_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Ссылка$").unwrap());
static FOR_CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^для\s+цитирования\s*:").unwrap());
static URL_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^URL\s*:$").unwrap());
static URL_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());
static DOI_OPEN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bDOI:\s*[0-9]+\.[0-9]+/\s*$").unwrap());
static DOI_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9\-]+$").unwrap());

/// Merge lines into paragraphs using the default configuration.
pub fn merge_lines_into_paragraphs(lines: &[String]) -> Vec<String> {
    merge_lines_into_paragraphs_with_config(lines, &ParsingConfig::default())
}

/// Merge lines into whitespace-normalized paragraphs.
///
/// Blank lines always end the open paragraph. Non-empty input always yields
/// at least one paragraph.
pub fn merge_lines_into_paragraphs_with_config(
    lines: &[String],
    config: &ParsingConfig,
) -> Vec<String> {
    let mut merger = ParagraphMerger::new(config);
    for line in pre_glue(lines) {
        merger.push_line(&line);
    }
    merger.finish()
}

/// Join line pairs that are known to belong together before any other rule
/// runs: "Ссылка" + "для цитирования: ...", "URL:" + link, and a DOI cut
/// right after its slash + the remaining suffix.
pub fn pre_glue(lines: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        let cur = lines[i].trim();
        let next = lines.get(i + 1).map(|s| s.trim()).unwrap_or("");

        if LINK_WORD.is_match(cur) && FOR_CITATION.is_match(next) {
            out.push(format!("{cur} {next}"));
            i += 2;
        } else if URL_LABEL.is_match(cur) && URL_START.is_match(next) {
            out.push(format!("{cur} {next}"));
            i += 2;
        } else if DOI_OPEN_PREFIX.is_match(cur) && DOI_SUFFIX.is_match(next) {
            out.push(format!("{cur}{next}"));
            i += 2;
        } else {
            out.push(cur.to_string());
            i += 1;
        }
    }
    out
}

/// A word cut by a line-end hyphen: "иссле-".
fn is_broken_word(segment: &str) -> bool {
    segment.ends_with('-') && char_len(segment) > 1
}

#[derive(Debug)]
struct OpenParagraph {
    text: String,
    last: String,
    broken: bool,
}

#[derive(Debug)]
enum MergerState {
    Empty,
    Accumulating(OpenParagraph),
}

/// Incremental paragraph builder; feed lines, then call [`finish`](Self::finish).
pub struct ParagraphMerger<'c> {
    config: &'c ParsingConfig,
    state: MergerState,
    paragraphs: Vec<String>,
}

impl<'c> ParagraphMerger<'c> {
    pub fn new(config: &'c ParsingConfig) -> Self {
        Self {
            config,
            state: MergerState::Empty,
            paragraphs: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            self.flush();
            return;
        }
        for segment in segment_line_typed(line) {
            self.push_segment(segment);
        }
    }

    fn push_segment(&mut self, segment: Segment) {
        if segment.is_isolated_head() {
            self.flush();
            self.emit(&segment.text);
            return;
        }

        let continues_word = matches!(&self.state, MergerState::Accumulating(open) if open.broken);
        let fragment = is_broken_word(&segment.text);
        if !continues_word && !fragment {
            if let Some(rule) = metadata_rule(&segment.text) {
                tracing::trace!(rule, segment = %segment.text, "standalone metadata segment");
                self.flush();
                self.emit(&segment.text);
                return;
            }
        }

        let action = match &self.state {
            MergerState::Empty => JoinAction::StartNew,
            MergerState::Accumulating(open) => {
                let ctx = JoinContext {
                    prev: &open.last,
                    cur: &segment.text,
                    accumulated_len: char_len(&open.text),
                    prev_broken: open.broken,
                    max_paragraph_chars: self.config.max_paragraph_chars,
                };
                let (action, rule) = decide_join(&ctx);
                tracing::trace!(rule, ?action, segment = %segment.text, "join decision");
                action
            }
        };

        let joined = match (&mut self.state, action) {
            (MergerState::Accumulating(open), JoinAction::Glue) => {
                open.text.pop();
                open.text.push_str(&segment.text);
                true
            }
            (MergerState::Accumulating(open), JoinAction::Merge) => {
                open.text.push(' ');
                open.text.push_str(&segment.text);
                true
            }
            _ => false,
        };
        if !joined {
            self.flush();
            self.state = MergerState::Accumulating(OpenParagraph {
                text: segment.text.clone(),
                last: String::new(),
                broken: false,
            });
        }

        if let MergerState::Accumulating(open) = &mut self.state {
            open.broken = fragment;
            open.last = segment.text;
        }
    }

    fn emit(&mut self, text: &str) {
        let text = normalize_spaces(text);
        if !text.is_empty() {
            self.paragraphs.push(text);
        }
    }

    fn flush(&mut self) {
        if let MergerState::Accumulating(open) =
            std::mem::replace(&mut self.state, MergerState::Empty)
        {
            self.emit(&open.text);
        }
    }

    /// Close any open paragraph and return everything built so far.
    pub fn finish(mut self) -> Vec<String> {
        self.flush();
        self.paragraphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_lines_into_paragraphs(&[]).is_empty());
    }

    #[test]
    fn test_open_sentence_lines_merge() {
        let out = merge_lines_into_paragraphs(&lines(&[
            "В работе рассматриваются особенности употребления",
            "глагольных форм в древнерусских памятниках",
            "XII–XIII вв. и позднее",
        ]));
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("В работе"));
        assert!(out[0].ends_with("XII–XIII вв. и позднее"));
    }

    #[test]
    fn test_hyphen_break_glued_without_space() {
        let out = merge_lines_into_paragraphs(&lines(&[
            "Настоящее иссле-",
            "дование посвящено истории языка.",
        ]));
        assert_eq!(out, vec!["Настоящее исследование посвящено истории языка."]);
    }

    #[test]
    fn test_line_end_hyphen_always_dropped() {
        let out = merge_lines_into_paragraphs(&lines(&[
            "Работа выполнена в Санкт-",
            "Петербургском университете.",
        ]));
        assert_eq!(out, vec!["Работа выполнена в СанктПетербургском университете."]);
    }

    #[test]
    fn test_blank_line_flushes() {
        let out = merge_lines_into_paragraphs(&lines(&[
            "Первая строка без точки",
            "",
            "вторая строка после пустой",
        ]));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_abstract_isolated() {
        let out = merge_lines_into_paragraphs(&lines(&[
            "Текст введения, который не закончен и",
            "Abstract. The paper deals with",
            "the history of the language",
        ]));
        assert_eq!(out[0], "Текст введения, который не закончен и");
        assert_eq!(out[1], "Abstract. The paper deals with");
        assert_eq!(out[2], "the history of the language");
    }

    #[test]
    fn test_metadata_standalone() {
        let out = merge_lines_into_paragraphs(&lines(&[
            "Статья посвящена анализу источников",
            "DOI: 10.31857/S0131-2",
            "и их датировке в историографии",
        ]));
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], "DOI: 10.31857/S0131-2");
    }

    #[test]
    fn test_pre_glue_pairs() {
        let glued = pre_glue(&lines(&[
            "Ссылка",
            "для цитирования: Иванов И.И.",
            "URL:",
            "https://example.org/a",
            "DOI: 10.7868/",
            "S0869544X",
            "rest",
        ]));
        assert_eq!(
            glued,
            vec![
                "Ссылка для цитирования: Иванов И.И.",
                "URL: https://example.org/a",
                "DOI: 10.7868/S0869544X",
                "rest",
            ]
        );
    }

    #[test]
    fn test_parenthesized_note_merges() {
        let out = merge_lines_into_paragraphs(&lines(&[
            "Petrov P. History of the Slavic languages.",
            "(In Russ.)",
        ]));
        assert_eq!(out, vec!["Petrov P. History of the Slavic languages. (In Russ.)"]);
    }

    #[test]
    fn test_sentence_start_opens_new_paragraph() {
        let out = merge_lines_into_paragraphs(&lines(&[
            "Первый абзац содержит достаточно длинное законченное предложение.",
            "Второй абзац начинается с новой мысли и заглавной буквы.",
        ]));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_every_line_survives() {
        let input = lines(&[
            "ВВЕДЕНИЕ",
            "Язык   древних   памятников изучен",
            "недостаточно.",
            "e-mail: a@b.ru",
            "Ключевые слова: язык, история",
            "Основной текст статьи продолжается здесь.",
        ]);
        let out = merge_lines_into_paragraphs(&input);
        let joined = out.join(" ");
        for line in &input {
            assert!(joined.contains(&normalize_spaces(line)), "lost: {line}");
        }
    }
}
