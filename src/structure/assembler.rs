//! Final document composition.

use crate::model::{DocumentTree, PageTree};

/// Wraps per-page trees into a [`DocumentTree`].
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    source: Option<String>,
    total_pages: u32,
}

impl DocumentAssembler {
    /// Create an assembler for a document with `total_pages` pages.
    pub fn new(total_pages: u32) -> Self {
        Self {
            source: None,
            total_pages,
        }
    }

    /// Record where the document came from.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Compose the pages, ordered by page number.
    pub fn assemble(self, mut pages: Vec<PageTree>) -> DocumentTree {
        pages.sort_by_key(|p| p.page);
        let total_pages = self
            .total_pages
            .max(pages.last().map(|p| p.page).unwrap_or(0));

        DocumentTree {
            source: self.source,
            total_pages,
            pages,
        }
    }
}
