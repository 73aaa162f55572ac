//! Running-title and page-number removal by cross-page frequency.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use reflow_core::{Page, normalize_key};

use crate::config::ParsingConfig;

static PAGE_NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\d+$",
        r"^стр\.\s*\d+",
        r"^page\s+\d+",
        r"^\d+\s*/\s*\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Journal boilerplate that is noise wherever it recurs: issue numbers, years.
static BOILERPLATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^№\s*\d+", r"^no\.\s*\d+", r"^\d{4}\s*г\.", r"^\d{4}$"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// True for a normalized (lowercased) line that looks like a page number.
pub fn is_page_number(normalized: &str) -> bool {
    PAGE_NUMBER_PATTERNS.iter().any(|re| re.is_match(normalized))
}

/// Page-number lines differ only in their digits; "page 3" and "page 4"
/// share the key "page #".
fn page_number_shape(normalized: &str) -> String {
    DIGITS.replace_all(normalized, "#").into_owned()
}

/// Remove recurring headers and footers using the default configuration.
pub fn filter_headers_footers(pages: &[Page]) -> Vec<String> {
    filter_headers_footers_with_config(pages, &ParsingConfig::default())
}

/// Remove recurring headers and footers, flattening the pages into one list.
///
/// A line is boilerplate when its normalized form recurs at least
/// [`ParsingConfig::repeat_threshold`] times and it either looks like a page
/// number or sits in the first/last `edge_lines` of its page. Of all qualifying
/// page-number lines only the earliest survives. With fewer than two pages the
/// lines are returned unchanged.
pub fn filter_headers_footers_with_config(pages: &[Page], config: &ParsingConfig) -> Vec<String> {
    if pages.len() < 2 {
        tracing::debug!(pages = pages.len(), "too few pages for header/footer filtering");
        return pages.iter().flatten().cloned().collect();
    }

    let threshold = config.repeat_threshold(pages.len());
    let edge = config.edge_lines();

    // key -> positions (page_idx, line_idx) in document order
    let mut positions: HashMap<LineKey, Vec<(usize, usize)>> = HashMap::new();
    for (page_idx, page) in pages.iter().enumerate() {
        for (line_idx, line) in page.iter().enumerate() {
            let normalized = normalize_key(line);
            if normalized.is_empty() {
                continue;
            }
            positions
                .entry(LineKey::of(&normalized))
                .or_default()
                .push((page_idx, line_idx));
        }
    }

    let mut remove: HashSet<(usize, usize)> = HashSet::new();
    let mut page_number_hits: Vec<(usize, usize)> = Vec::new();

    for (key, occurrences) in &positions {
        if occurrences.len() < threshold {
            continue;
        }
        match key {
            LineKey::PageNumber(_) => page_number_hits.extend(occurrences.iter().copied()),
            LineKey::Text(text) => {
                let boilerplate = BOILERPLATE_PATTERNS.iter().any(|re| re.is_match(text));
                for &(page_idx, line_idx) in occurrences {
                    let page_len = pages[page_idx].len();
                    let at_edge = line_idx < edge || line_idx + edge >= page_len;
                    if boilerplate || at_edge {
                        remove.insert((page_idx, line_idx));
                    }
                }
            }
        }
    }

    // Keep the first page-number line of the whole document, drop the rest.
    page_number_hits.sort_unstable();
    remove.extend(page_number_hits.iter().skip(1).copied());

    tracing::debug!(
        pages = pages.len(),
        threshold,
        removed = remove.len(),
        "header/footer filter"
    );

    let mut result = Vec::new();
    for (page_idx, page) in pages.iter().enumerate() {
        for (line_idx, line) in page.iter().enumerate() {
            if !remove.contains(&(page_idx, line_idx)) {
                result.push(line.clone());
            }
        }
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LineKey {
    PageNumber(String),
    Text(String),
}

impl LineKey {
    fn of(normalized: &str) -> Self {
        if is_page_number(normalized) {
            LineKey::PageNumber(page_number_shape(normalized))
        } else {
            LineKey::Text(normalized.to_string())
        }
    }
}

const SERVICE_KEYWORDS: &[&str] = &["удк", "udc", "doi", "e-mail", "email", "@", "©", "copyright"];

/// Short fragments and lines carrying УДК/DOI/e-mail/copyright markers.
pub fn is_service_line(line: &str) -> bool {
    let text = line.trim();
    if text.chars().count() < 3 {
        return true;
    }
    let lower = text.to_lowercase();
    SERVICE_KEYWORDS.iter().any(|k| lower.contains(k))
}
