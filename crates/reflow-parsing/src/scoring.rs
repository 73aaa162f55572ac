//! Advisory quality score for a normalized bibliography.
//!
//! The score never changes what the normalizer returns; it only tells the
//! caller how much the entries look like well-formed references.

use once_cell::sync::Lazy;
use regex::Regex;
use reflow_core::text::char_len;
use serde::{Deserialize, Serialize};

pub(crate) static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:18|19|20)\d{2}\b").unwrap());
pub(crate) static DOI_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdoi\s*:\s*|https?://doi\.org/").unwrap());
pub(crate) static PAGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:pp?\.\s*\d+(?:[–-]\d+)?|с\.\s*\d+(?:[–-]\d+)?)\b").unwrap()
});
static BROKEN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S*\s+\S+").unwrap());

/// Weights for the four score components.
///
/// - `year`: share of entries carrying a plausible year
/// - `locator`: share carrying page numbers or a DOI
/// - `length`: one minus the share of truncated entries
/// - `urls`: one minus the share of entries with a URL split by whitespace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub year: f64,
    pub locator: f64,
    pub length: f64,
    pub urls: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            year: 0.45,
            locator: 0.35,
            length: 0.10,
            urls: 0.10,
        }
    }
}

/// Score entries with the default weights and a 20-character truncation limit.
pub fn score_entries(entries: &[String]) -> f64 {
    score_entries_with(entries, &ScoreWeights::default(), 20)
}

/// Weighted quality score in `[0, 1]`; `0.0` for no entries.
pub fn score_entries_with(entries: &[String], weights: &ScoreWeights, min_entry_chars: usize) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let year = share(entries, |e| YEAR.is_match(e));
    let locator = share(entries, |e| PAGES.is_match(e) || DOI_MARK.is_match(e));
    let short = share(entries, |e| char_len(e.trim()) < min_entry_chars);
    let broken = share(entries, |e| BROKEN_URL.is_match(e));

    let score = weights.year * year
        + weights.locator * locator
        + weights.length * (1.0 - short).max(0.0)
        + weights.urls * (1.0 - broken).max(0.0);

    tracing::debug!(entries = entries.len(), year, locator, short, broken, score, "bibliography score");
    score.clamp(0.0, 1.0)
}

/// Fraction of `entries` satisfying `pred`.
fn share(entries: &[String], pred: impl Fn(&str) -> bool) -> f64 {
    entries.iter().filter(|e| pred(e.as_str())).count() as f64 / entries.len() as f64
}
