//! Extraction result with warnings and statistics.

use serde::{Deserialize, Serialize};

use crate::error::Warning;
use crate::model::{DocumentTree, Node};

/// A finished extraction: the tree plus everything that was recovered from.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub tree: DocumentTree,
    pub warnings: Vec<Warning>,
    pub stats: ExtractionStats,
}

/// Statistics collected during content extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Number of pages in the output
    pub page_count: u32,

    /// Number of section nodes, continuations included
    pub section_count: u32,

    /// Number of paragraphs
    pub paragraph_count: u32,

    /// Number of tables
    pub table_count: u32,

    /// Number of chart/image regions
    pub chart_count: u32,

    /// Spans dropped as page furniture
    pub dropped_span_count: u32,

    /// Recovered warnings
    pub warning_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,
}

impl ExtractionStats {
    /// Count the nodes of a finished tree.
    pub fn from_tree(tree: &DocumentTree) -> Self {
        let mut stats = Self {
            page_count: tree.pages.len() as u32,
            ..Self::default()
        };

        for node in tree.nodes() {
            match node {
                Node::Section(section) => {
                    stats.section_count += 1;
                    if !section.continued {
                        stats.count_text(&section.title);
                    }
                }
                Node::Paragraph { text } => {
                    stats.paragraph_count += 1;
                    stats.count_text(text);
                }
                Node::Table { rows } => {
                    stats.table_count += 1;
                    rows.iter().flatten().for_each(|cell| stats.count_text(cell));
                }
                Node::Chart => stats.chart_count += 1,
            }
        }
        stats
    }

    /// Add word counts from text.
    pub fn count_text(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.page_count += other.page_count;
        self.section_count += other.section_count;
        self.paragraph_count += other.paragraph_count;
        self.table_count += other.table_count;
        self.chart_count += other.chart_count;
        self.dropped_span_count += other.dropped_span_count;
        self.warning_count += other.warning_count;
        self.word_count += other.word_count;
    }
}
