//! Classified content blocks.

use serde::{Deserialize, Serialize};

/// The atomic unit consumed by the hierarchy builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A heading with its inferred level (1 = largest)
    Heading { level: u8, text: String },

    /// A paragraph of text
    Paragraph { text: String },

    /// A table as rows of cell strings
    Table { rows: Vec<Vec<String>> },

    /// An image or chart region
    Chart,
}

impl ContentBlock {
    /// Create a heading block.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    /// Create a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    /// Create a table block.
    pub fn table(rows: Vec<Vec<String>>) -> Self {
        Self::Table { rows }
    }

    /// Heading level, if this is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Self::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }

    /// Text of a heading or paragraph.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Heading { text, .. } | Self::Paragraph { text } => Some(text),
            _ => None,
        }
    }

    /// Check if the block is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Self::Heading { .. })
    }
}
