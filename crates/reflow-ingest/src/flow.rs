//! Shared post-processing for flow formats (DOCX, RTF), which carry
//! paragraphs rather than positioned words.

use reflow_core::normalize_spaces;
use reflow_core::text::strip_invisible;

/// Options applied to the blocks read from a flow document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowOptions {
    /// Append `https://doi.org/...` lines to the block before them.
    pub merge_doi_urls: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            merge_doi_urls: true,
        }
    }
}

/// Normalize raw blocks into lines: invisible characters removed, whitespace
/// collapsed, empty blocks dropped. Consecutive blocks are separated by an
/// empty line so each source paragraph stays a paragraph.
pub fn blocks_to_lines(blocks: &[String], options: FlowOptions) -> Vec<String> {
    let lines: Vec<String> = blocks
        .iter()
        .map(|b| normalize_spaces(&strip_invisible(b)))
        .filter(|l| !l.is_empty())
        .collect();
    let lines = if options.merge_doi_urls {
        merge_doi_url_lines(&lines)
    } else {
        lines
    };

    let mut out = Vec::with_capacity(lines.len() * 2);
    for line in lines {
        if !out.is_empty() {
            out.push(String::new());
        }
        out.push(line);
    }
    out
}

/// Join a line that starts with `http` and points at doi.org onto the
/// previous line.
pub fn merge_doi_url_lines(lines: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(prev) if is_doi_url(line) => {
                prev.push(' ');
                prev.push_str(line);
            }
            _ => out.push(line.to_string()),
        }
    }
    out
}

fn is_doi_url(line: &str) -> bool {
    line.starts_with("http") && line.to_lowercase().contains("doi.org")
}
