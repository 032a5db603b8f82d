//! Raw per-page content produced by the extractor.

use serde::{Deserialize, Serialize};

/// A run of text with uniform font attributes.
///
/// `y_position` is measured from the top of the page, so larger values are
/// further down. Spans of one page are ordered by reading position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Whether the font appears to be bold
    pub bold: bool,
    /// Whether the font appears to be italic
    pub italic: bool,
    /// Page number (1-indexed)
    pub page: u32,
    /// Distance of the baseline from the top of the page
    pub y_position: f32,
    /// Left edge of the span
    pub x_position: f32,
}

impl TextSpan {
    /// Create a span, deriving bold/italic flags from the font name.
    pub fn new(
        text: impl Into<String>,
        font_size: f32,
        font_name: impl Into<String>,
        page: u32,
        y_position: f32,
    ) -> Self {
        let font_name = font_name.into();
        let lower = font_name.to_lowercase();
        let bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let italic = lower.contains("italic") || lower.contains("oblique");

        Self {
            text: text.into(),
            font_size,
            font_name,
            bold,
            italic,
            page,
            y_position,
            x_position: 0.0,
        }
    }

    /// Set the left edge and return self.
    pub fn at_x(mut self, x: f32) -> Self {
        self.x_position = x;
        self
    }

    /// Force the bold flag and return self.
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Whether the span carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A table region as rows of cell strings. Rows may be ragged until the
/// table normalizer has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    /// Cell text, row by row
    pub rows: Vec<Vec<String>>,
    /// Page number (1-indexed)
    pub page: u32,
    /// Distance of the table's top edge from the top of the page
    pub y_position: f32,
}

impl TableBlock {
    /// Create a table block.
    pub fn new(rows: Vec<Vec<String>>, page: u32, y_position: f32) -> Self {
        Self {
            rows,
            page,
            y_position,
        }
    }

    /// Create a table block from string slices.
    pub fn from_strs(rows: &[&[&str]], page: u32, y_position: f32) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        Self::new(rows, page, y_position)
    }
}

/// Axis-aligned rectangle in top-down page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BoundingBox {
    /// Create a bounding box, normalizing the corner order.
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0: x0.min(x1),
            top: top.min(bottom),
            x1: x0.max(x1),
            bottom: top.max(bottom),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// A box with no area.
    pub fn is_empty(&self) -> bool {
        self.width() <= f32::EPSILON || self.height() <= f32::EPSILON
    }
}

/// An image or chart region. Carries no semantic content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub bounding_box: BoundingBox,
    /// Page number (1-indexed)
    pub page: u32,
}

impl ImageBlock {
    pub fn new(bounding_box: BoundingBox, page: u32) -> Self {
        Self { bounding_box, page }
    }
}

/// Everything the extractor found on one page, each collection in reading order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page: u32,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    pub spans: Vec<TextSpan>,
    pub tables: Vec<TableBlock>,
    pub images: Vec<ImageBlock>,
}

impl PageContent {
    /// Create an empty page with the given dimensions.
    pub fn new(page: u32, width: f32, height: f32) -> Self {
        Self {
            page,
            width,
            height,
            ..Default::default()
        }
    }

    /// Create an empty US Letter page.
    pub fn letter(page: u32) -> Self {
        Self::new(page, 612.0, 792.0)
    }

    /// Add a span and return self.
    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.spans.push(span);
        self
    }

    /// Add a table and return self.
    pub fn with_table(mut self, table: TableBlock) -> Self {
        self.tables.push(table);
        self
    }

    /// Add an image and return self.
    pub fn with_image(mut self, image: ImageBlock) -> Self {
        self.images.push(image);
        self
    }

    /// Whether nothing at all was found on the page.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.tables.is_empty() && self.images.is_empty()
    }
}
