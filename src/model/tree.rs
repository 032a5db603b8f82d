//! The output tree.
//!
//! Serializes to the JSON shape consumers rely on:
//!
//! ```json
//! {"source": "in.pdf", "total_pages": 2, "pages": [
//!   {"page": 1, "content": [
//!     {"type": "section", "title": "Intro", "level": 1, "children": [
//!       {"type": "paragraph", "text": "..."},
//!       {"type": "table", "rows": [["a", "b"]]},
//!       {"type": "chart"}
//!     ]}
//!   ]}
//! ]}
//! ```

use serde::{Deserialize, Serialize};

use super::ContentBlock;

/// A node of a page's content: a section or a non-heading block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// A section opened by a heading
    Section(Section),

    /// A paragraph of text
    Paragraph { text: String },

    /// A rectangular table
    Table { rows: Vec<Vec<String>> },

    /// An image or chart region
    Chart,
}

impl Node {
    /// Convert a non-heading content block into a node.
    ///
    /// Headings never appear standalone in the tree, so they yield `None`.
    pub fn from_block(block: ContentBlock) -> Option<Self> {
        match block {
            ContentBlock::Heading { .. } => None,
            ContentBlock::Paragraph { text } => Some(Node::Paragraph { text }),
            ContentBlock::Table { rows } => Some(Node::Table { rows }),
            ContentBlock::Chart => Some(Node::Chart),
        }
    }

    /// The section, if this node is one.
    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Node::Section(section) => Some(section),
            _ => None,
        }
    }
}

/// A hierarchy node created by a heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub level: u8,
    /// Set on the copy of a section that carries over from a previous page.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continued: bool,
    pub children: Vec<Node>,
}

impl Section {
    /// Create an empty section.
    pub fn new(title: impl Into<String>, level: u8) -> Self {
        Self {
            title: title.into(),
            level,
            continued: false,
            children: Vec::new(),
        }
    }

    /// Create an empty continuation of a section opened on an earlier page.
    pub fn continuation(title: impl Into<String>, level: u8) -> Self {
        Self {
            continued: true,
            ..Self::new(title, level)
        }
    }

    /// Nested sections directly under this one.
    pub fn subsections(&self) -> impl Iterator<Item = &Section> {
        self.children.iter().filter_map(Node::as_section)
    }
}

/// One page of the output tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTree {
    /// Page number (1-indexed)
    pub page: u32,
    /// Top-level sections and blocks in reading order
    pub content: Vec<Node>,
}

impl PageTree {
    /// Create an empty page.
    pub fn new(page: u32) -> Self {
        Self {
            page,
            content: Vec::new(),
        }
    }

    /// Check if the page has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// The complete extraction result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentTree {
    /// Input path, when the document came from a file
    pub source: Option<String>,
    /// Page count of the source document
    pub total_pages: u32,
    pub pages: Vec<PageTree>,
}

impl DocumentTree {
    /// Depth-first iterator over every node of every page.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        let mut stack: Vec<&Node> = self
            .pages
            .iter()
            .rev()
            .flat_map(|p| p.content.iter().rev())
            .collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Node::Section(section) = node {
                stack.extend(section.children.iter().rev());
            }
            Some(node)
        })
    }

    /// Paragraph texts in tree traversal order.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.nodes()
            .filter_map(|node| match node {
                Node::Paragraph { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All sections in tree traversal order.
    pub fn sections(&self) -> Vec<&Section> {
        self.nodes().filter_map(Node::as_section).collect()
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page: u32) -> Option<&PageTree> {
        self.pages.iter().find(|p| p.page == page)
    }
}
