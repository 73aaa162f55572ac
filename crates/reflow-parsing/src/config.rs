use regex::Regex;

use crate::scoring::ScoreWeights;

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Search terms located by [`crate::blocks::find_text_blocks`] when none are given.
pub const DEFAULT_BLOCK_TERMS: &[&str] = &[
    "Резюме",
    "Аннотация",
    "Abstract",
    "Annotation",
    "Ключевые слова",
    "Keywords",
];

/// Upper bound for the column gutter ratio; wider gutters stop meaning "center".
pub const MAX_GUTTER_RATIO: f32 = 0.4;

/// Thresholds and pattern overrides for the reconstruction pipeline.
///
/// Regex fields are `Option<Regex>`: `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct from string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── header_footer.rs ──
    /// Lower bound of the repeat threshold (default: 3).
    pub(crate) min_repeats: usize,
    /// Fraction of pages a line must repeat on (default: 0.3).
    pub(crate) page_ratio: f64,
    /// Lines at each end of a page considered header/footer territory (default: 2).
    pub(crate) edge_lines: usize,
    /// Drop УДК/DOI/e-mail/© service lines before merging (default: false).
    pub(crate) drop_service_lines: bool,

    // ── columns.rs ──
    pub(crate) gutter_ratio: f32,
    pub(crate) min_words_per_column: usize,
    /// Max vertical distance (points) between words on the same line.
    pub(crate) line_tolerance: f32,

    // ── paragraph.rs ──
    /// Accumulated length past which an uppercase segment opens a new paragraph.
    pub(crate) max_paragraph_chars: usize,

    // ── bibliography.rs ──
    pub(crate) references_header_re: Option<Regex>,
    pub(crate) references_end_re: Option<Regex>,

    // ── scoring.rs ──
    /// Entries shorter than this (in characters) count as truncated (default: 20).
    pub(crate) min_entry_chars: usize,
    pub(crate) score_weights: Option<ScoreWeights>,

    // ── blocks.rs ──
    pub(crate) block_terms: ListOverride<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            min_repeats: 3,
            page_ratio: 0.3,
            edge_lines: 2,
            drop_service_lines: false,
            gutter_ratio: 0.1,
            min_words_per_column: 10,
            line_tolerance: 3.0,
            max_paragraph_chars: 500,
            references_header_re: None,
            references_end_re: None,
            min_entry_chars: 20,
            score_weights: None,
            block_terms: ListOverride::Default,
        }
    }
}

impl ParsingConfig {
    /// Gutter ratio clamped to `[0, MAX_GUTTER_RATIO]`.
    pub fn gutter_ratio(&self) -> f32 {
        if self.gutter_ratio.is_nan() {
            return 0.0;
        }
        self.gutter_ratio.clamp(0.0, MAX_GUTTER_RATIO)
    }

    pub fn min_words_per_column(&self) -> usize {
        self.min_words_per_column
    }

    pub fn line_tolerance(&self) -> f32 {
        self.line_tolerance
    }

    pub fn edge_lines(&self) -> usize {
        self.edge_lines
    }

    pub fn drop_service_lines(&self) -> bool {
        self.drop_service_lines
    }

    /// Repeat count a line needs across a `page_count`-page document to be
    /// considered boilerplate: `max(min_repeats, ceil(page_ratio * pages))`.
    pub fn repeat_threshold(&self, page_count: usize) -> usize {
        // 0.3 * 10 is 3.0000000000000004 in binary floating point
        let by_ratio = (self.page_ratio * page_count as f64 - 1e-9).ceil().max(0.0) as usize;
        self.min_repeats.max(by_ratio)
    }

    pub fn max_paragraph_chars(&self) -> usize {
        self.max_paragraph_chars
    }

    pub fn min_entry_chars(&self) -> usize {
        self.min_entry_chars
    }

    /// Score weights, using defaults if not configured.
    pub fn score_weights(&self) -> ScoreWeights {
        self.score_weights.clone().unwrap_or_default()
    }

    /// Resolved list of bounding-box search terms.
    pub fn block_terms(&self) -> Vec<String> {
        let defaults: Vec<String> = DEFAULT_BLOCK_TERMS.iter().map(|s| s.to_string()).collect();
        self.block_terms.resolve(&defaults)
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    min_repeats: Option<usize>,
    page_ratio: Option<f64>,
    edge_lines: Option<usize>,
    drop_service_lines: Option<bool>,
    gutter_ratio: Option<f32>,
    min_words_per_column: Option<usize>,
    line_tolerance: Option<f32>,
    max_paragraph_chars: Option<usize>,
    references_header_re: Option<String>,
    references_end_re: Option<String>,
    min_entry_chars: Option<usize>,
    score_weights: Option<ScoreWeights>,
    block_terms: ListOverride<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Header/footer filter ──

    pub fn min_repeats(mut self, n: usize) -> Self {
        self.min_repeats = Some(n);
        self
    }

    pub fn page_ratio(mut self, ratio: f64) -> Self {
        self.page_ratio = Some(ratio);
        self
    }

    pub fn edge_lines(mut self, n: usize) -> Self {
        self.edge_lines = Some(n);
        self
    }

    pub fn drop_service_lines(mut self, drop: bool) -> Self {
        self.drop_service_lines = Some(drop);
        self
    }

    // ── Columns ──

    pub fn gutter_ratio(mut self, ratio: f32) -> Self {
        self.gutter_ratio = Some(ratio);
        self
    }

    pub fn min_words_per_column(mut self, n: usize) -> Self {
        self.min_words_per_column = Some(n);
        self
    }

    pub fn line_tolerance(mut self, points: f32) -> Self {
        self.line_tolerance = Some(points);
        self
    }

    // ── Paragraphs ──

    pub fn max_paragraph_chars(mut self, n: usize) -> Self {
        self.max_paragraph_chars = Some(n);
        self
    }

    // ── References block ──

    pub fn references_header_regex(mut self, pattern: &str) -> Self {
        self.references_header_re = Some(pattern.to_string());
        self
    }

    pub fn references_end_regex(mut self, pattern: &str) -> Self {
        self.references_end_re = Some(pattern.to_string());
        self
    }

    // ── Scoring ──

    pub fn min_entry_chars(mut self, n: usize) -> Self {
        self.min_entry_chars = Some(n);
        self
    }

    pub fn score_weights(mut self, weights: ScoreWeights) -> Self {
        self.score_weights = Some(weights);
        self
    }

    // ── Bounding-box terms ──

    pub fn set_block_terms(mut self, terms: Vec<String>) -> Self {
        self.block_terms = ListOverride::Replace(terms);
        self
    }

    pub fn add_block_term(mut self, term: String) -> Self {
        match &mut self.block_terms {
            ListOverride::Extend(v) => v.push(term),
            _ => self.block_terms = ListOverride::Extend(vec![term]),
        }
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };
        let defaults = ParsingConfig::default();

        Ok(ParsingConfig {
            min_repeats: self.min_repeats.unwrap_or(defaults.min_repeats),
            page_ratio: self.page_ratio.unwrap_or(defaults.page_ratio),
            edge_lines: self.edge_lines.unwrap_or(defaults.edge_lines),
            drop_service_lines: self
                .drop_service_lines
                .unwrap_or(defaults.drop_service_lines),
            gutter_ratio: self.gutter_ratio.unwrap_or(defaults.gutter_ratio),
            min_words_per_column: self
                .min_words_per_column
                .unwrap_or(defaults.min_words_per_column),
            line_tolerance: self.line_tolerance.unwrap_or(defaults.line_tolerance),
            max_paragraph_chars: self
                .max_paragraph_chars
                .unwrap_or(defaults.max_paragraph_chars),
            references_header_re: compile(self.references_header_re)?,
            references_end_re: compile(self.references_end_re)?,
            min_entry_chars: self.min_entry_chars.unwrap_or(defaults.min_entry_chars),
            score_weights: self.score_weights,
            block_terms: self.block_terms,
        })
    }
}
