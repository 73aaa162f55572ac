//! Column detection and reading-order reconstruction from word geometry.

use std::cmp::Ordering;

use reflow_core::{BoundingBox, Page, PageLayout, PageSource, Word};

use crate::config::ParsingConfig;

/// Count text columns on a page: 2 when both sides of the center gutter hold
/// at least `min_words_per_column` words, otherwise 1.
///
/// A word counts as left when it ends before `center * (1 - gutter)` and as
/// right when it starts after `center * (1 + gutter)`; words straddling the
/// gutter count for neither side.
pub fn detect_columns(layout: &PageLayout, config: &ParsingConfig) -> usize {
    if layout.words.is_empty() || layout.width <= 0.0 {
        return 1;
    }
    let center = layout.width / 2.0;
    let gutter = config.gutter_ratio();
    let left_border = center * (1.0 - gutter);
    let right_border = center * (1.0 + gutter);

    let left = layout
        .words
        .iter()
        .filter(|w| w.bbox.x1 <= left_border)
        .count();
    let right = layout
        .words
        .iter()
        .filter(|w| w.bbox.x0 >= right_border)
        .count();

    let min = config.min_words_per_column();
    if left >= min && right >= min { 2 } else { 1 }
}

/// Lines of one page in reading order: the left half before the right half on
/// two-column pages, the whole page otherwise.
pub fn reorder_page(layout: &PageLayout, config: &ParsingConfig) -> Page {
    let tolerance = config.line_tolerance();
    if layout.width <= 0.0 || layout.height <= 0.0 {
        tracing::warn!(
            page = layout.number,
            width = layout.width,
            height = layout.height,
            "degenerate page geometry, reading page as a single column"
        );
        return words_to_lines(layout.words.iter(), tolerance);
    }

    if detect_columns(layout, config) == 1 {
        return words_to_lines(layout.words.iter(), tolerance);
    }

    let center = layout.width / 2.0;
    let (left, right): (Vec<&Word>, Vec<&Word>) = layout
        .words
        .iter()
        .partition(|w| w.bbox.center_x() < center);
    tracing::debug!(
        page = layout.number,
        left = left.len(),
        right = right.len(),
        "two-column page"
    );

    let mut lines = words_to_lines(left.into_iter(), tolerance);
    lines.extend(words_to_lines(right.into_iter(), tolerance));
    lines
}

/// Lines for any page source; positioned pages go through column reordering.
pub fn page_lines(source: &PageSource, config: &ParsingConfig) -> Page {
    match source {
        PageSource::Positioned(layout) => reorder_page(layout, config),
        PageSource::Lines(lines) => lines.clone(),
    }
}

/// Lines of every page, each page in reading order.
pub fn pages_in_reading_order(sources: &[PageSource], config: &ParsingConfig) -> Vec<Page> {
    sources.iter().map(|s| page_lines(s, config)).collect()
}

/// Text of the words whose center falls inside `region`, as lines.
pub fn text_in_region(layout: &PageLayout, region: &BoundingBox, tolerance: f32) -> Page {
    let inside = layout.words.iter().filter(|w| {
        let cx = w.bbox.center_x();
        let cy = (w.bbox.top + w.bbox.bottom) / 2.0;
        cx >= region.x0 && cx <= region.x1 && cy >= region.top && cy <= region.bottom
    });
    words_to_lines(inside, tolerance)
}

/// Group words into lines: sort top-to-bottom, start a new line whenever the
/// vertical jump exceeds `tolerance`, then order each line left-to-right.
pub fn words_to_lines<'a>(words: impl Iterator<Item = &'a Word>, tolerance: f32) -> Page {
    let mut words: Vec<&Word> = words.filter(|w| !w.text.trim().is_empty()).collect();
    if words.is_empty() {
        return Vec::new();
    }
    words.sort_by(|a, b| {
        cmp_f32(a.bbox.top, b.bbox.top).then(cmp_f32(a.bbox.x0, b.bbox.x0))
    });

    let mut lines = Vec::new();
    let mut current: Vec<&Word> = Vec::new();
    let mut current_top = words[0].bbox.top;

    for word in words {
        if (word.bbox.top - current_top).abs() > tolerance && !current.is_empty() {
            lines.push(assemble_line(std::mem::take(&mut current)));
            current_top = word.bbox.top;
        }
        current.push(word);
    }
    if !current.is_empty() {
        lines.push(assemble_line(current));
    }
    lines
}

fn assemble_line(mut words: Vec<&Word>) -> String {
    words.sort_by(|a, b| cmp_f32(a.bbox.x0, b.bbox.x0));
    words
        .iter()
        .map(|w| w.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
