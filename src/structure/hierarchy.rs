//! Section nesting from a flat block stream.

use crate::model::{ContentBlock, Node, PageTree, Section};

/// Builds the section tree from blocks in reading order.
///
/// Open sections live on a stack, innermost last. A section is attached to
/// its parent (or to the page) when it is closed, which happens when a
/// heading of the same or a higher rank arrives, at a page break, or at the
/// end of the document.
///
/// Sections stay open across page breaks. The part of an open section that
/// falls on a later page is emitted on that page as a continuation node
/// (same title and level, `continued: true`), and only if it receives
/// content there.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    stack: Vec<Section>,
    current: Option<PageTree>,
    pages: Vec<PageTree>,
}

impl HierarchyBuilder {
    /// Create a builder with no open sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new page. Sections open on the previous page carry over.
    pub fn begin_page(&mut self, page: u32) {
        let carried: Vec<(String, u8)> = self
            .stack
            .iter()
            .map(|s| (s.title.clone(), s.level))
            .collect();

        if self.current.is_some() {
            self.close_all();
        }
        if let Some(done) = self.current.replace(PageTree::new(page)) {
            self.pages.push(done);
        }

        self.stack = carried
            .into_iter()
            .map(|(title, level)| Section::continuation(title, level))
            .collect();
        if !self.stack.is_empty() {
            log::trace!("Page {}: carrying {} open sections", page, self.stack.len());
        }
    }

    /// Feed the next block.
    pub fn push(&mut self, block: ContentBlock) {
        if self.current.is_none() {
            self.begin_page(1);
        }

        match block {
            ContentBlock::Heading { level, text } => {
                while self.stack.last().is_some_and(|top| top.level >= level) {
                    self.close_top();
                }
                self.stack.push(Section::new(text, level));
            }
            other => {
                if let Some(node) = Node::from_block(other) {
                    self.attach(node);
                }
            }
        }
    }

    /// Number of currently open sections.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Close everything and return the pages in the order they were begun.
    pub fn finish(mut self) -> Vec<PageTree> {
        self.close_all();
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
        self.pages
    }

    /// Attach a node to the innermost open section, or to the page.
    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(section) => section.children.push(node),
            None => {
                if let Some(page) = self.current.as_mut() {
                    page.content.push(node);
                }
            }
        }
    }

    fn close_top(&mut self) {
        if let Some(section) = self.stack.pop() {
            if section.continued && section.children.is_empty() {
                return;
            }
            self.attach(Node::Section(section));
        }
    }

    fn close_all(&mut self) {
        while !self.stack.is_empty() {
            self.close_top();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> ContentBlock {
        ContentBlock::paragraph(text)
    }

    fn build(pages: Vec<(u32, Vec<ContentBlock>)>) -> Vec<PageTree> {
        let mut builder = HierarchyBuilder::new();
        for (page, blocks) in pages {
            builder.begin_page(page);
            for block in blocks {
                builder.push(block);
            }
        }
        builder.finish()
    }

    #[test]
    fn test_no_headings_stay_top_level() {
        let pages = build(vec![(1, vec![para("a"), para("b")])]);
        assert_eq!(
            pages[0].content,
            vec![
                Node::Paragraph { text: "a".into() },
                Node::Paragraph { text: "b".into() }
            ]
        );
    }

    #[test]
    fn test_nested_sections() {
        let pages = build(vec![(
            1,
            vec![
                ContentBlock::heading(1, "Chapter 1"),
                para("Intro text."),
                ContentBlock::heading(2, "Section A"),
                para("Body A."),
            ],
        )]);

        let mut section_a = Section::new("Section A", 2);
        section_a.children.push(Node::Paragraph { text: "Body A.".into() });
        let mut chapter = Section::new("Chapter 1", 1);
        chapter.children.push(Node::Paragraph { text: "Intro text.".into() });
        chapter.children.push(Node::Section(section_a));

        assert_eq!(pages[0].content, vec![Node::Section(chapter)]);
    }

    #[test]
    fn test_equal_level_closes_sibling() {
        let pages = build(vec![(
            1,
            vec![
                ContentBlock::heading(2, "A"),
                para("a"),
                ContentBlock::heading(2, "B"),
                para("b"),
            ],
        )]);
        let titles: Vec<_> = pages[0]
            .content
            .iter()
            .filter_map(Node::as_section)
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_skipped_levels_nest() {
        let mut builder = HierarchyBuilder::new();
        builder.push(ContentBlock::heading(1, "Top"));
        builder.push(ContentBlock::heading(3, "Deep"));
        assert_eq!(builder.depth(), 2);
        builder.push(ContentBlock::heading(2, "Middle"));
        assert_eq!(builder.depth(), 2);
        builder.push(ContentBlock::heading(1, "Next"));
        assert_eq!(builder.depth(), 1);

        let pages = builder.finish();
        assert_eq!(pages.len(), 1);
        let top = pages[0].content[0].as_section().unwrap();
        let nested: Vec<_> = top.subsections().map(|s| (s.title.as_str(), s.level)).collect();
        assert_eq!(nested, vec![("Deep", 3), ("Middle", 2)]);
    }

    #[test]
    fn test_content_before_heading_is_top_level() {
        let pages = build(vec![(
            1,
            vec![
                ContentBlock::table(vec![vec!["x".into()]]),
                ContentBlock::heading(1, "H"),
                ContentBlock::Chart,
            ],
        )]);
        assert!(matches!(pages[0].content[0], Node::Table { .. }));
        let section = pages[0].content[1].as_section().unwrap();
        assert_eq!(section.children, vec![Node::Chart]);
    }

    #[test]
    fn test_section_continues_on_next_page() {
        let pages = build(vec![
            (1, vec![ContentBlock::heading(1, "Chapter"), para("one")]),
            (2, vec![para("two"), ContentBlock::heading(1, "Next")]),
        ]);

        let first = pages[0].content[0].as_section().unwrap();
        assert!(!first.continued);
        assert_eq!(first.children, vec![Node::Paragraph { text: "one".into() }]);

        let cont = pages[1].content[0].as_section().unwrap();
        assert!(cont.continued);
        assert_eq!((cont.title.as_str(), cont.level), ("Chapter", 1));
        assert_eq!(cont.children, vec![Node::Paragraph { text: "two".into() }]);

        let next = pages[1].content[1].as_section().unwrap();
        assert_eq!(next.title, "Next");
        assert!(!next.continued);
    }

    #[test]
    fn test_empty_continuation_discarded() {
        let pages = build(vec![
            (
                1,
                vec![
                    ContentBlock::heading(1, "Chapter"),
                    ContentBlock::heading(2, "Part"),
                    para("one"),
                ],
            ),
            (2, vec![ContentBlock::heading(2, "Other part"), para("two")]),
        ]);

        // Page 2 holds only the continued chapter with the new part inside.
        assert_eq!(pages[1].content.len(), 1);
        let chapter = pages[1].content[0].as_section().unwrap();
        assert!(chapter.continued);
        let parts: Vec<_> = chapter.subsections().map(|s| s.title.as_str()).collect();
        assert_eq!(parts, vec!["Other part"]);
    }

    #[test]
    fn test_empty_pages_are_kept() {
        let pages = build(vec![(1, vec![ContentBlock::heading(1, "A")]), (2, vec![]), (3, vec![])]);
        assert_eq!(pages.len(), 3);
        assert!(pages[1].is_empty());
        assert!(pages[2].is_empty());
    }

    #[test]
    fn test_trailing_empty_heading_kept() {
        let pages = build(vec![(1, vec![para("x"), ContentBlock::heading(2, "Appendix")])]);
        let section = pages[0].content[1].as_section().unwrap();
        assert!(section.children.is_empty());
    }
}
