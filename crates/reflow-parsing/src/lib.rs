//! Heuristic reconstruction of paragraphs from extracted document lines.
//!
//! Pipeline (see [`DocumentConverter`]):
//! 1. Reorder positioned words into reading order, splitting two-column pages
//! 2. Drop running titles and page numbers by cross-page frequency
//! 3. Cut lines into segments and merge them into paragraphs
//! 4. Rebuild the references block into one entry per reference
//! 5. Render paragraphs as escaped HTML

pub mod bibliography;
pub mod blocks;
pub mod columns;
pub mod config;
pub mod converter;
pub mod header_footer;
pub mod html;
pub mod paragraph;
pub mod rules;
pub mod scoring;
pub mod segment;

pub use bibliography::{
    BibliographyEntry, NormalizedReferences, locate_references_block, normalize_references,
    normalize_references_block, normalize_references_block_with_config,
};
pub use blocks::{
    find_annotation_block, find_annotation_block_with_config, find_text_blocks,
    find_text_blocks_with_config,
};
pub use columns::{detect_columns, pages_in_reading_order, reorder_page};
pub use config::{DEFAULT_BLOCK_TERMS, ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use converter::{Conversion, ConversionWarning, DocumentConverter};
pub use header_footer::{filter_headers_footers, filter_headers_footers_with_config};
pub use html::{escape_html, paragraphs_to_html};
pub use paragraph::{merge_lines_into_paragraphs, merge_lines_into_paragraphs_with_config};
pub use scoring::{ScoreWeights, score_entries};
pub use segment::segment_line;
// Re-export domain types from core (canonical definitions live there)
pub use reflow_core::{
    BoundingBox, Margins, Page, PageLayout, PageSource, Script, TextBlockMatch, Word,
    dominant_script, normalize_spaces,
};
