//! Ordered rule tables driving the paragraph merger.
//!
//! Each table is data: a slice of named predicates evaluated top to bottom,
//! first match wins. Rules are plain functions so each one can be tested on
//! its own.

use once_cell::sync::Lazy;
use regex::Regex;
use reflow_core::text::{char_len, uppercase_ratio};

use crate::segment::{ARTICLE_TYPE_RE, CITATION_HEAD, REFERENCES_HEAD};

static METADATA_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdoi\b|https?://|@|©|\b\d{4}\s*г\.").unwrap());

static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\([^)]+\)\.?\s*$").unwrap());

/// Volume/issue/page/year fragments that continue a bibliographic line.
static BIB_CONTINUATION: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\s*\d+/\d+\.\s*\d{4}\.",
        r"^\s*\d{4}\.\s*[Ss]\.\s*\d+",
        r"(?i)^\s*[SsCcPpСс]+\.?\s*\d+[–-]\d+\.?\s*$",
        r"(?i)^\s*[SsCcPpСс]+\.?\s*\d+\.?\s*$",
        r"(?i)^\s*\d+\s*[PpСс]+\.?\s*$",
        r"^\s*\d+[–-]\d+\.?\s*$",
        r"^\s*\d+/\d+\.",
        r"(?i)^\s*(?:Vol\.|Т\.|№)\s*\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Minimum length for the mostly-uppercase heading rule.
const UPPERCASE_MIN_LEN: usize = 6;
const UPPERCASE_RATIO: f64 = 0.7;

pub struct MetadataRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
}

/// Segments that are metadata or headings rather than running prose.
pub static METADATA_RULES: &[MetadataRule] = &[
    MetadataRule {
        name: "too-short",
        matches: is_too_short,
    },
    MetadataRule {
        name: "metadata-hint",
        matches: has_metadata_hint,
    },
    MetadataRule {
        name: "article-type",
        matches: is_article_type,
    },
    MetadataRule {
        name: "citation-head",
        matches: is_citation_head,
    },
    MetadataRule {
        name: "references-head",
        matches: is_references_head,
    },
    MetadataRule {
        name: "mostly-uppercase",
        matches: is_mostly_uppercase,
    },
];

fn is_too_short(s: &str) -> bool {
    char_len(s) < 10
}

fn has_metadata_hint(s: &str) -> bool {
    METADATA_HINT.is_match(s)
}

fn is_article_type(s: &str) -> bool {
    ARTICLE_TYPE_RE.is_match(s)
}

fn is_citation_head(s: &str) -> bool {
    CITATION_HEAD.is_match(s)
}

fn is_references_head(s: &str) -> bool {
    REFERENCES_HEAD.is_match(s)
}

fn is_mostly_uppercase(s: &str) -> bool {
    char_len(s) >= UPPERCASE_MIN_LEN && uppercase_ratio(s) >= UPPERCASE_RATIO
}

/// Name of the first metadata rule matching `segment`, if any.
pub fn metadata_rule(segment: &str) -> Option<&'static str> {
    let segment = segment.trim();
    METADATA_RULES
        .iter()
        .find(|r| (r.matches)(segment))
        .map(|r| r.name)
}

pub fn is_likely_metadata(segment: &str) -> bool {
    metadata_rule(segment).is_some()
}

/// What to do with the incoming segment relative to the open paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinAction {
    /// Append with no separator (word broken by a hyphen).
    Glue,
    /// Append with a single space.
    Merge,
    /// Close the open paragraph and open a new one with this segment.
    StartNew,
}

/// Inputs for a join decision.
#[derive(Debug, Clone, Copy)]
pub struct JoinContext<'a> {
    /// Last segment added to the open paragraph.
    pub prev: &'a str,
    pub cur: &'a str,
    /// Length of the open paragraph so far, in characters.
    pub accumulated_len: usize,
    /// `prev` ended in a word-breaking hyphen.
    pub prev_broken: bool,
    pub max_paragraph_chars: usize,
}

pub struct JoinRule {
    pub name: &'static str,
    pub applies: fn(&JoinContext<'_>) -> bool,
    pub action: JoinAction,
}

/// Join rules in priority order; unmatched segments start a new paragraph.
pub static JOIN_RULES: &[JoinRule] = &[
    JoinRule {
        name: "word-break",
        applies: word_break,
        action: JoinAction::Glue,
    },
    JoinRule {
        name: "parenthesized-note",
        applies: parenthesized_note,
        action: JoinAction::Merge,
    },
    JoinRule {
        name: "bibliographic-continuation",
        applies: bibliographic_continuation,
        action: JoinAction::Merge,
    },
    JoinRule {
        name: "short-lowercase",
        applies: short_lowercase,
        action: JoinAction::Merge,
    },
    JoinRule {
        name: "open-sentence",
        applies: open_sentence,
        action: JoinAction::Merge,
    },
    JoinRule {
        name: "soft-punctuation",
        applies: soft_punctuation,
        action: JoinAction::Merge,
    },
    JoinRule {
        name: "lowercase-after-period",
        applies: lowercase_after_period,
        action: JoinAction::Merge,
    },
    JoinRule {
        name: "sentence-start",
        applies: sentence_start,
        action: JoinAction::StartNew,
    },
    JoinRule {
        name: "paragraph-too-long",
        applies: paragraph_too_long,
        action: JoinAction::StartNew,
    },
];

/// Decide how `ctx.cur` joins the open paragraph, with the deciding rule's name.
pub fn decide_join(ctx: &JoinContext<'_>) -> (JoinAction, &'static str) {
    JOIN_RULES
        .iter()
        .find(|r| (r.applies)(ctx))
        .map(|r| (r.action, r.name))
        .unwrap_or((JoinAction::StartNew, "default"))
}

fn starts_lowercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_lowercase)
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

fn word_break(ctx: &JoinContext<'_>) -> bool {
    ctx.prev_broken
}

fn parenthesized_note(ctx: &JoinContext<'_>) -> bool {
    PARENTHESIZED.is_match(ctx.cur)
}

fn bibliographic_continuation(ctx: &JoinContext<'_>) -> bool {
    BIB_CONTINUATION.iter().any(|re| re.is_match(ctx.cur))
}

fn short_lowercase(ctx: &JoinContext<'_>) -> bool {
    ctx.cur.split_whitespace().count() <= 2 && starts_lowercase(ctx.cur)
}

fn open_sentence(ctx: &JoinContext<'_>) -> bool {
    !ctx.prev.trim_end().ends_with(['.', '!', '?', ':', ';'])
        && (char_len(ctx.cur) < 40 || starts_lowercase(ctx.cur))
}

fn soft_punctuation(ctx: &JoinContext<'_>) -> bool {
    ctx.prev.trim_end().ends_with([',', ':', ';'])
        && (char_len(ctx.cur) < 50 || starts_lowercase(ctx.cur))
}

fn lowercase_after_period(ctx: &JoinContext<'_>) -> bool {
    ctx.prev.trim_end().ends_with('.') && char_len(ctx.cur) < 30 && starts_lowercase(ctx.cur)
}

fn sentence_start(ctx: &JoinContext<'_>) -> bool {
    ctx.prev.trim_end().ends_with(['.', '!', '?'])
        && starts_uppercase(ctx.cur)
        && char_len(ctx.cur) > 20
        && ctx.accumulated_len > 50
}

fn paragraph_too_long(ctx: &JoinContext<'_>) -> bool {
    ctx.accumulated_len > ctx.max_paragraph_chars && starts_uppercase(ctx.cur)
}
