//! Locating labelled blocks (abstract, keywords) by word geometry.

use reflow_core::{BoundingBox, Margins, PageLayout, TextBlockMatch, Word};
use regex::Regex;

use crate::columns::text_in_region;
use crate::config::ParsingConfig;

/// Terms tried, in order, by [`find_annotation_block`].
pub const ANNOTATION_TERMS: &[&str] = &["Резюме", "Аннотация", "Abstract", "Annotation"];

/// Expansion used for annotation blocks: a little above the label, 100 points below.
pub const ANNOTATION_MARGINS: Margins = Margins {
    left: 0.0,
    top: -10.0,
    right: 0.0,
    bottom: 100.0,
};

/// Characters of page text returned when nothing lies inside the expanded box.
const FALLBACK_CHARS: usize = 500;

/// Find each term on each page using the default configuration.
pub fn find_text_blocks(layouts: &[PageLayout], terms: &[String], expand: Margins) -> Vec<TextBlockMatch> {
    find_text_blocks_with_config(layouts, terms, expand, &ParsingConfig::default())
}

/// For every page and term, the first run of words matching the term.
///
/// Matching is case-insensitive substring matching per word, so "Аннотация."
/// matches "аннотация"; a multi-word term must match consecutive words. The
/// result carries the tight box of the matched words, that box grown by
/// `expand` and clamped to the page, and the text of the words inside it.
pub fn find_text_blocks_with_config(
    layouts: &[PageLayout],
    terms: &[String],
    expand: Margins,
    config: &ParsingConfig,
) -> Vec<TextBlockMatch> {
    let line_tolerance = config.line_tolerance();
    let mut matches = Vec::new();
    for layout in layouts {
        for term in terms {
            let needle: Vec<String> = term.split_whitespace().map(str::to_lowercase).collect();
            if needle.is_empty() {
                continue;
            }
            let Some(bbox) = locate_term(&layout.words, &needle) else {
                continue;
            };
            let expanded_bbox = bbox.expand_within(expand, layout.width, layout.height);
            let mut text = text_in_region(layout, &expanded_bbox, line_tolerance).join("\n");
            if text.trim().is_empty() {
                text = text_after_term(layout, &needle);
            }
            tracing::debug!(term = %term, page = layout.number, "text block found");
            matches.push(TextBlockMatch {
                term: term.clone(),
                page: layout.number,
                bbox,
                expanded_bbox,
                text,
            });
        }
    }
    matches
}

/// First abstract-like block in the document, expanded downward.
pub fn find_annotation_block(layouts: &[PageLayout]) -> Option<TextBlockMatch> {
    find_annotation_block_with_config(layouts, &ParsingConfig::default())
}

pub fn find_annotation_block_with_config(
    layouts: &[PageLayout],
    config: &ParsingConfig,
) -> Option<TextBlockMatch> {
    let terms: Vec<String> = ANNOTATION_TERMS.iter().map(|t| t.to_string()).collect();
    for layout in layouts {
        if let Some(m) = find_text_blocks_with_config(
            std::slice::from_ref(layout),
            &terms,
            ANNOTATION_MARGINS,
            config,
        )
        .into_iter()
        .next()
        {
            return Some(m);
        }
    }
    None
}

/// Union box of the first window of words matching `needle` word by word.
fn locate_term(words: &[Word], needle: &[String]) -> Option<BoundingBox> {
    if words.len() < needle.len() {
        return None;
    }
    words.windows(needle.len()).find_map(|window| {
        let hit = window
            .iter()
            .zip(needle)
            .all(|(w, n)| w.text.to_lowercase().contains(n.as_str()));
        hit.then(|| {
            window[1..]
                .iter()
                .fold(window[0].bbox, |acc, w| acc.union(&w.bbox))
        })
    })
}

/// Page text following the first occurrence of the term.
fn text_after_term(layout: &PageLayout, needle: &[String]) -> String {
    let page_text = layout
        .words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let pattern = needle.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join(r"\s+");
    let Ok(re) = Regex::new(&format!("(?i){pattern}")) else {
        return String::new();
    };
    let Some(m) = re.find(&page_text) else {
        return String::new();
    };
    page_text[m.end()..].chars().take(FALLBACK_CHARS).collect::<String>().trim().to_string()
}
