use serde::{Deserialize, Serialize};

pub mod backend;
pub mod config_file;
pub mod text;

pub use backend::{BackendInfo, DocumentBackend, ExtractionError};
pub use text::{Script, dominant_script, normalize_key, normalize_spaces};

/// One page of extracted text, top to bottom.
pub type Page = Vec<String>;

/// Axis-aligned box in page points, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Grow the box outward by `margins` and clamp it to a `width` x `height` page.
    ///
    /// Negative margins shrink the corresponding edge.
    pub fn expand_within(&self, margins: Margins, width: f32, height: f32) -> BoundingBox {
        BoundingBox {
            x0: (self.x0 - margins.left).max(0.0),
            top: (self.top - margins.top).max(0.0),
            x1: (self.x1 + margins.right).min(width),
            bottom: (self.bottom + margins.bottom).min(height),
        }
    }

    /// True if `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.top >= self.top && other.bottom <= self.bottom
    }
}

/// Per-edge expansion in points: `(left, top, right, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Margins {
    pub const ZERO: Margins = Margins {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// A single positioned word on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Geometry of one page: its size and the words found on it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: usize,
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
}

/// What a backend produces for each page of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum PageSource {
    /// Positioned words; the column reorderer decides the reading order.
    Positioned(PageLayout),
    /// Lines already in reading order (flow formats, or a page whose geometry
    /// could not be read).
    Lines(Page),
}

/// A search term located on a page, with its tight and expanded boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlockMatch {
    pub term: String,
    /// 1-based page number.
    pub page: usize,
    pub bbox: BoundingBox,
    pub expanded_bbox: BoundingBox,
    pub text: String,
}
