//! Second pass over the references block: one normalized string per entry.
//!
//! Extracted reference lists are full of artifacts. Running titles recur
//! inside the block, URLs and DOIs are cut at line ends, words are split by
//! stray spaces ("ко митетов"), and one entry spans several lines. This
//! module locates the block, removes those artifacts and rebuilds the
//! entries, then attaches an advisory [`score`](crate::scoring).

use std::collections::HashMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reflow_core::text::char_len;
use reflow_core::{Script, dominant_script, normalize_key, normalize_spaces};
use serde::Serialize;

use crate::config::ParsingConfig;
use crate::scoring::score_entries_with;

static REFERENCES_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:СПИСОК\s+ЛИТЕРАТУРЫ|ЛИТЕРАТУРА|REFERENCES|BIBLIOGRAPHY|СПИСОК\s+ИСТОЧНИКОВ)\b",
    )
    .unwrap()
});
static REFERENCES_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:Поступила|Рукопись|Received|Accepted|Информация\s+об\s+авторе|Information\s+about\s+the\s+author)\b",
    )
    .unwrap()
});

static NUMBERED_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[\d{1,4}\]|\d{1,4}[.)])\s+").unwrap());
static CYRILLIC_AUTHOR_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[А-ЯЁ][а-яё-]+(?:\s+[А-ЯЁ][а-яё-]+){0,2}\s+[А-ЯЁ]\.\s*[А-ЯЁ]\.").unwrap()
});
static LATIN_AUTHOR_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[A-Z][A-Za-z\-']+(?:\s+[A-Z][A-Za-z\-']+){0,2},?\s+(?:[A-Z]\.\s*){1,3}")
        .unwrap()
});

static RUNNING_TITLE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:19|20)\d{2}\b|№\s*\d+|\bpp?\.|\bс\.|Славяноведение|Slavic Studies")
        .unwrap()
});

static URL_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*URL\s*:?\s*$").unwrap());
static URL_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://\S*$").unwrap());
static DOI_CUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)DOI:\s*\S+/\s*$").unwrap());
static DOI_REST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9][A-Z0-9\-./]+$").unwrap());

static CYRILLIC_FRAGMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([А-Яа-яЁё]{1,4})\s+([А-Яа-яЁё]{2,})\b").unwrap());
static LATIN_FRAGMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z]{1,3})\s+([A-Za-z]{2,})\b").unwrap());

static URL_LABEL_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bURL\s*:\s*").unwrap());
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([,.;:])").unwrap());
static SPACE_AFTER_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s+").unwrap());
static SPACE_BEFORE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\)").unwrap());

/// Short words that are never the first half of a split word.
const FUNCTION_WORDS: &[&str] = &[
    // Russian
    "а", "в", "во", "и", "к", "о", "об", "обо", "с", "со", "у", "я", "на", "по", "от",
    "до", "из", "за", "для", "под", "над", "при", "без", "про", "не", "ни", "но", "да", "же",
    "ли", "бы", "как", "или", "что", "это", "эта", "этот", "эти", "его", "её", "ее", "их",
    "он", "она", "оно", "они", "мы", "вы", "ты", "им", "все", "всё", "так", "там", "тут",
    "был", "была", "было", "были", "есть", "уже", "еще", "ещё", "лишь", "даже", "если", "то",
    "чем", "кто", "где", "год", "том", "сб", "ред", "пер", "изд", "гг", "вв", "ст",
    // English and common Latin-script particles
    "a", "an", "and", "as", "at", "by", "for", "in", "is", "of", "on", "or", "the", "to",
    "with", "from", "into", "its", "his", "her", "our", "are", "was", "new", "old", "not",
    "but", "all", "how", "why", "who", "can", "may", "one", "two", "vol", "no", "pp", "ed",
    "eds", "de", "la", "le", "du", "der", "die", "das", "von", "van", "und",
];

/// One reconstructed reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BibliographyEntry {
    pub text: String,
    pub script: Script,
}

impl BibliographyEntry {
    fn new(text: String) -> Self {
        let script = dominant_script(&text);
        Self { text, script }
    }
}

/// Entries of a located references block and their quality score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedReferences {
    pub entries: Vec<BibliographyEntry>,
    pub score: f64,
}

impl NormalizedReferences {
    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.text.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalize the references block with the default configuration.
///
/// Returns `([], 0.0)` when there is no references header or the block is
/// empty.
pub fn normalize_references_block(lines: &[String]) -> (Vec<String>, f64) {
    normalize_references_block_with_config(lines, &ParsingConfig::default())
}

pub fn normalize_references_block_with_config(
    lines: &[String],
    config: &ParsingConfig,
) -> (Vec<String>, f64) {
    match normalize_references(lines, config) {
        Some(refs) => (refs.texts(), refs.score),
        None => (Vec::new(), 0.0),
    }
}

/// Body of the references block within `lines`: everything after the first
/// header line up to the first end marker or the end of input.
pub fn locate_references_block(lines: &[String], config: &ParsingConfig) -> Option<Range<usize>> {
    let header = config.references_header_re.as_ref().unwrap_or(&*REFERENCES_HEADER);
    let end_marker = config.references_end_re.as_ref().unwrap_or(&*REFERENCES_END);

    let start = lines.iter().position(|l| header.is_match(l.trim()))?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| end_marker.is_match(l.trim()))
        .map_or(lines.len(), |offset| start + 1 + offset);
    Some(start + 1..end)
}

/// Locate and rebuild the references block; `None` when there is no header.
pub fn normalize_references(lines: &[String], config: &ParsingConfig) -> Option<NormalizedReferences> {
    let raw: Vec<String> = lines
        .iter()
        .map(|l| normalize_spaces(l))
        .filter(|l| !l.is_empty())
        .collect();

    let Some(range) = locate_references_block(&raw, config) else {
        tracing::debug!(lines = raw.len(), "no references header found");
        return None;
    };
    let block = &raw[range];
    if block.is_empty() {
        return Some(NormalizedReferences {
            entries: Vec::new(),
            score: 0.0,
        });
    }

    let kept = strip_running_titles(block);
    let glued = glue_split_identifiers(&kept);
    let repaired: Vec<String> = glued.iter().map(|l| repair_split_words(l)).collect();
    let texts: Vec<String> = split_entries(&repaired)
        .into_iter()
        .map(|e| clean_entry(&e))
        .filter(|e| !e.is_empty())
        .collect();

    let score = score_entries_with(&texts, &config.score_weights(), config.min_entry_chars());
    tracing::debug!(
        block_lines = block.len(),
        kept = kept.len(),
        entries = texts.len(),
        score,
        "references normalized"
    );

    Some(NormalizedReferences {
        entries: texts.into_iter().map(BibliographyEntry::new).collect(),
        score,
    })
}

/// Drop lines that recur inside the block and look like a running title.
fn strip_running_titles(block: &[String]) -> Vec<String> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for line in block.iter().filter(|l| char_len(l) >= 8) {
        *freq.entry(normalize_key(line)).or_default() += 1;
    }
    let min_freq = if block.len() >= 40 { 3 } else { 2 };

    block
        .iter()
        .filter(|line| {
            let repeats = freq.get(&normalize_key(line)).copied().unwrap_or(0);
            !(repeats >= min_freq && looks_like_running_title(line))
        })
        .cloned()
        .collect()
}

fn looks_like_running_title(line: &str) -> bool {
    RUNNING_TITLE_HINT.is_match(line) && char_len(line) < 120
}

/// Rejoin "URL:" with its link, a DOI cut after the slash with its suffix and
/// a URL cut after `.`, `/` or `-` with its continuation.
fn glue_split_identifiers(lines: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        let cur = &lines[i];
        let Some(next) = lines.get(i + 1) else {
            out.push(cur.clone());
            break;
        };

        let joined = if URL_LABEL.is_match(cur) && URL_ONLY.is_match(next) {
            Some(format!("{cur} {next}"))
        } else if DOI_CUT.is_match(cur) && DOI_REST.is_match(next) {
            Some(format!("{cur}{next}"))
        } else if URL_ONLY.is_match(cur)
            && !starts_with_scheme(next)
            && cur.ends_with(['.', '/', '-'])
        {
            Some(format!("{cur}{next}"))
        } else {
            None
        };

        match joined {
            Some(line) => {
                out.push(normalize_spaces(&line));
                i += 2;
            }
            None => {
                out.push(cur.clone());
                i += 1;
            }
        }
    }
    out
}

fn starts_with_scheme(s: &str) -> bool {
    let lower = s.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Join words split by a stray space: "ко митетов" → "комитетов",
/// "Mod ern" → "Modern".
///
/// A pair is joined only when the first piece is not a function word, is not
/// preceded by a period (initials) and the second piece starts lowercase.
pub fn repair_split_words(text: &str) -> String {
    let once = join_fragments(text, &CYRILLIC_FRAGMENTS);
    join_fragments(&once, &LATIN_FRAGMENTS)
}

fn join_fragments(text: &str, re: &Regex) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(caps) = re.captures_at(text, search) {
        let (Some(whole), Some(first), Some(second)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            break;
        };
        if is_split_word(text, &caps) {
            out.push_str(&text[copied..first.end()]);
            out.push_str(second.as_str());
            copied = whole.end();
            search = whole.end();
        } else {
            // the second piece may itself start a split word
            search = second.start();
        }
    }
    out.push_str(&text[copied..]);
    out
}

fn is_split_word(text: &str, caps: &Captures<'_>) -> bool {
    let (Some(first), Some(second)) = (caps.get(1), caps.get(2)) else {
        return false;
    };
    let after_period = text[..first.start()].ends_with('.');
    let function_word = FUNCTION_WORDS.contains(&first.as_str().to_lowercase().as_str());
    let second_lower = second.as_str().chars().next().is_some_and(char::is_lowercase);
    !after_period && !function_word && second_lower
}

fn is_entry_start(line: &str) -> bool {
    NUMBERED_START.is_match(line)
        || CYRILLIC_AUTHOR_START.is_match(line)
        || LATIN_AUTHOR_START.is_match(line)
}

/// Group lines into entries. Lines before the first entry start are noise;
/// every later line that does not start an entry continues the current one.
fn split_entries(lines: &[String]) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut skipped = 0usize;

    for line in lines {
        if is_entry_start(line) {
            if !current.is_empty() {
                entries.push(current.join(" "));
            }
            current = vec![line.as_str()];
        } else if current.is_empty() {
            skipped += 1;
        } else {
            current.push(line.as_str());
        }
    }
    if !current.is_empty() {
        entries.push(current.join(" "));
    }
    if skipped > 0 {
        tracing::debug!(skipped, "lines before the first reference dropped");
    }
    entries
}

fn clean_entry(entry: &str) -> String {
    let text = normalize_spaces(&repair_split_words(entry));
    let text = URL_LABEL_SPACING.replace_all(&text, "URL: ");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    let text = SPACE_AFTER_OPEN.replace_all(&text, "(");
    let text = SPACE_BEFORE_CLOSE.replace_all(&text, ")");
    text.trim().to_string()
}
