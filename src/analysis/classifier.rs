//! Typing of raw page content into content blocks.

use std::collections::HashMap;

use regex::Regex;

use crate::error::Warning;
use crate::model::{ContentBlock, PageContent, TextSpan};

use super::font_profile::{size_key, FontProfile};

/// Options for the block classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyOptions {
    /// Pages an identical line must appear on to count as a running header
    pub repeat_min_pages: usize,

    /// How far apart (as a fraction of page height) repeats may sit
    pub repeat_position_tolerance: f32,

    /// Largest baseline gap, in multiples of the font size, between two
    /// spans of one paragraph
    pub line_gap_factor: f32,

    /// Heading-sized text longer than this is kept as a paragraph
    pub max_heading_chars: usize,

    /// Drop lines that are only a page number
    pub drop_page_numbers: bool,
}

impl ClassifyOptions {
    /// Create classifier options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the running header repeat threshold.
    pub fn with_repeat_min_pages(mut self, pages: usize) -> Self {
        self.repeat_min_pages = pages;
        self
    }

    /// Set the paragraph line gap factor.
    pub fn with_line_gap_factor(mut self, factor: f32) -> Self {
        self.line_gap_factor = factor;
        self
    }

    /// Set the heading length limit.
    pub fn with_max_heading_chars(mut self, chars: usize) -> Self {
        self.max_heading_chars = chars;
        self
    }

    /// Enable or disable page number removal.
    pub fn with_page_numbers_dropped(mut self, drop: bool) -> Self {
        self.drop_page_numbers = drop;
        self
    }
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            repeat_min_pages: 3,
            repeat_position_tolerance: 0.02,
            line_gap_factor: 1.6,
            max_heading_chars: 200,
            drop_page_numbers: true,
        }
    }
}

/// Blocks of one page in reading order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPage {
    pub page: u32,
    pub blocks: Vec<ContentBlock>,
}

/// Output of [`BlockClassifier::classify`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub pages: Vec<ClassifiedPage>,
    pub warnings: Vec<Warning>,
    /// Spans dropped as whitespace, decoration, page numbers or running headers
    pub dropped_spans: usize,
}

/// A page item positioned for reading-order merging.
enum Item<'a> {
    Text(&'a TextSpan),
    Table(&'a [Vec<String>]),
    Chart,
}

/// Font attributes paragraphs must share to be merged.
#[derive(Debug, Clone, PartialEq)]
struct FontKey<'a> {
    size: i32,
    bold: bool,
    italic: bool,
    name: &'a str,
}

impl<'a> FontKey<'a> {
    fn of(span: &'a TextSpan) -> Self {
        Self {
            size: size_key(span.font_size),
            bold: span.bold,
            italic: span.italic,
            name: &span.font_name,
        }
    }
}

/// The last paragraph or heading emitted, kept open for merging.
struct OpenBlock<'a> {
    key: FontKey<'a>,
    y: f32,
    size: f32,
}

/// Classifies spans against a [`FontProfile`] and passes tables and images
/// through.
pub struct BlockClassifier<'a> {
    profile: &'a FontProfile,
    options: &'a ClassifyOptions,
    page_number: Regex,
}

impl<'a> BlockClassifier<'a> {
    /// Create a classifier.
    pub fn new(profile: &'a FontProfile, options: &'a ClassifyOptions) -> Self {
        Self {
            profile,
            options,
            page_number: Regex::new(
                r"(?i)^\s*(?:[-–—]?\s*\d+\s*[-–—]?|page\s+\d+(?:\s+of\s+\d+)?)\s*$",
            )
            .unwrap(),
        }
    }

    /// Classify every page. Blocks keep the relative order of their sources.
    pub fn classify(&self, pages: &[PageContent]) -> Classification {
        let repeats = RepeatIndex::build(pages, self.options);
        let mut result = Classification::default();

        for page in pages {
            let mut blocks = Vec::new();
            let mut open: Option<OpenBlock> = None;

            for item in reading_order(page) {
                let span = match item {
                    Item::Text(span) => span,
                    Item::Table(rows) => {
                        open = None;
                        blocks.push(ContentBlock::table(rows.to_vec()));
                        continue;
                    }
                    Item::Chart => {
                        open = None;
                        blocks.push(ContentBlock::Chart);
                        continue;
                    }
                };

                if self.is_decorative(span, page, &repeats) {
                    log::trace!("Dropping decorative span on page {}: {:?}", page.page, span.text);
                    result.dropped_spans += 1;
                    continue;
                }

                let block = self.classify_span(span, &mut result.warnings);
                let key = FontKey::of(span);
                let merge = open
                    .as_ref()
                    .is_some_and(|prev| self.continues(prev, &key, span));
                let merged = merge
                    && match (blocks.last_mut(), &block) {
                        (
                            Some(ContentBlock::Paragraph { text: prev }),
                            ContentBlock::Paragraph { text },
                        ) => {
                            join_paragraph(prev, text);
                            true
                        }
                        // A heading wrapped onto several lines.
                        (
                            Some(ContentBlock::Heading { level: prev_level, text: prev }),
                            ContentBlock::Heading { level, text },
                        ) if *prev_level == *level => {
                            join_paragraph(prev, text);
                            true
                        }
                        _ => false,
                    };
                if !merged {
                    blocks.push(block);
                }
                open = Some(OpenBlock {
                    key,
                    y: span.y_position,
                    size: span.font_size,
                });
            }

            result.pages.push(ClassifiedPage {
                page: page.page,
                blocks,
            });
        }

        if result.dropped_spans > 0 {
            log::debug!("Dropped {} decorative spans", result.dropped_spans);
        }
        result
    }

    /// Heading or paragraph for one span, recording a warning when the span
    /// falls back to paragraph.
    fn classify_span(&self, span: &TextSpan, warnings: &mut Vec<Warning>) -> ContentBlock {
        let mut fallback = |reason: String| {
            let warning = Warning::Classification {
                page: span.page,
                text: span.text.clone(),
                reason,
            };
            log::warn!("{}", warning);
            warnings.push(warning);
            ContentBlock::paragraph(span.text.clone())
        };

        if !span.font_size.is_finite() || span.font_size <= 0.0 {
            return fallback(format!("invalid font size {}", span.font_size));
        }

        match self.profile.heading_level(span.font_size, span.bold) {
            Some(_) if span.text.chars().count() > self.options.max_heading_chars => {
                fallback(format!(
                    "heading-sized text longer than {} characters",
                    self.options.max_heading_chars
                ))
            }
            Some(level) => ContentBlock::heading(level, span.text.clone()),
            None => ContentBlock::paragraph(span.text.clone()),
        }
    }

    fn is_decorative(&self, span: &TextSpan, page: &PageContent, repeats: &RepeatIndex) -> bool {
        if !span.text.chars().any(char::is_alphanumeric) {
            return true;
        }
        if self.options.drop_page_numbers && self.page_number.is_match(&span.text) {
            return true;
        }
        repeats.is_repeated(span, page.height)
    }

    /// Whether `span` continues the open paragraph or heading.
    fn continues(&self, prev: &OpenBlock, key: &FontKey, span: &TextSpan) -> bool {
        if prev.key != *key {
            return false;
        }
        let gap = span.y_position - prev.y;
        gap > 0.0 && gap <= self.options.line_gap_factor * prev.size
    }
}

/// Append a continuation line. A trailing hyphen after a letter keeps the
/// line break so the text normalizer can rejoin the word.
fn join_paragraph(text: &mut String, next: &str) {
    let mut tail = text.trim_end().chars().rev();
    let hyphenated = tail.next() == Some('-') && tail.next().is_some_and(char::is_alphabetic);

    let trimmed = text.trim_end().len();
    text.truncate(trimmed);
    text.push(if hyphenated { '\n' } else { ' ' });
    text.push_str(next.trim_start());
}

/// Interleave tables and images with the text spans by vertical position.
///
/// Spans keep their extracted order; each table or image is placed before
/// the first span that starts below it.
fn reading_order(page: &PageContent) -> Vec<Item<'_>> {
    let mut others: Vec<(f32, Item<'_>)> = page
        .tables
        .iter()
        .map(|t| (t.y_position, Item::Table(&t.rows)))
        .chain(page.images.iter().map(|i| (i.bounding_box.top, Item::Chart)))
        .collect();
    others.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut items = Vec::with_capacity(page.spans.len() + others.len());
    let mut pending = others.into_iter().peekable();
    for span in &page.spans {
        while let Some(item) = pending.next_if(|(y, _)| *y < span.y_position) {
            items.push(item.1);
        }
        items.push(Item::Text(span));
    }
    items.extend(pending.map(|(_, item)| item));
    items
}

/// Positions of every line of text across the document, for running
/// header and footer detection.
struct RepeatIndex {
    min_pages: usize,
    tolerance: f32,
    lines: HashMap<String, Vec<(u32, f32)>>,
}

impl RepeatIndex {
    fn build(pages: &[PageContent], options: &ClassifyOptions) -> Self {
        let mut lines: HashMap<String, Vec<(u32, f32)>> = HashMap::new();
        if options.repeat_min_pages > 0 && pages.len() >= options.repeat_min_pages {
            for page in pages.iter().filter(|p| p.height > 0.0) {
                for span in &page.spans {
                    lines
                        .entry(repeat_key(&span.text))
                        .or_default()
                        .push((page.page, span.y_position / page.height));
                }
            }
        }
        Self {
            min_pages: options.repeat_min_pages,
            tolerance: options.repeat_position_tolerance,
            lines,
        }
    }

    fn is_repeated(&self, span: &TextSpan, page_height: f32) -> bool {
        if page_height <= 0.0 {
            return false;
        }
        let Some(positions) = self.lines.get(&repeat_key(&span.text)) else {
            return false;
        };
        let rel_y = span.y_position / page_height;

        let mut pages: Vec<u32> = positions
            .iter()
            .filter(|(_, y)| (y - rel_y).abs() <= self.tolerance)
            .map(|(page, _)| *page)
            .collect();
        pages.sort_unstable();
        pages.dedup();
        pages.len() >= self.min_pages
    }
}

fn repeat_key(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ProfileOptions;
    use crate::model::{BoundingBox, ImageBlock, TableBlock};

    fn span(text: &str, size: f32, page: u32, y: f32) -> TextSpan {
        TextSpan::new(text, size, "Helvetica", page, y)
    }

    fn classify(pages: &[PageContent], options: &ClassifyOptions) -> Classification {
        let profile = FontProfile::analyze(pages.iter().flat_map(|p| &p.spans), &ProfileOptions::default());
        BlockClassifier::new(&profile, options).classify(pages)
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let page = PageContent::letter(1)
            .with_span(span("Chapter 1", 18.0, 1, 72.0))
            .with_span(span("Intro text that is long enough to be body.", 12.0, 1, 100.0))
            .with_span(span("Section A", 14.0, 1, 140.0))
            .with_span(span("Body A is also body text.", 12.0, 1, 170.0));

        let result = classify(&[page], &ClassifyOptions::default());
        assert_eq!(
            result.pages[0].blocks,
            vec![
                ContentBlock::heading(1, "Chapter 1"),
                ContentBlock::paragraph("Intro text that is long enough to be body."),
                ContentBlock::heading(2, "Section A"),
                ContentBlock::paragraph("Body A is also body text."),
            ]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_merges_contiguous_lines() {
        let page = PageContent::letter(1)
            .with_span(span("First line of a", 12.0, 1, 100.0))
            .with_span(span("paragraph that conti-", 12.0, 1, 114.0))
            .with_span(span("nues here.", 12.0, 1, 128.0))
            .with_span(span("A new paragraph after a gap.", 12.0, 1, 180.0));

        let result = classify(&[page], &ClassifyOptions::default());
        assert_eq!(
            result.pages[0].blocks,
            vec![
                ContentBlock::paragraph("First line of a paragraph that conti-\nnues here."),
                ContentBlock::paragraph("A new paragraph after a gap."),
            ]
        );
    }

    #[test]
    fn test_merges_wrapped_heading() {
        let page = PageContent::letter(1)
            .with_span(span("Chapter 1: A Rather Long Title That", 18.0, 1, 72.0))
            .with_span(span("Wraps Onto A Second Line", 18.0, 1, 94.0))
            .with_span(span(&"Body text under the long title. ".repeat(4), 12.0, 1, 130.0));

        let result = classify(&[page], &ClassifyOptions::default());
        let blocks = &result.pages[0].blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            ContentBlock::heading(1, "Chapter 1: A Rather Long Title That Wraps Onto A Second Line")
        );
        assert!(!blocks[1].is_heading());
    }

    #[test]
    fn test_separate_headings_not_merged() {
        let page = PageContent::letter(1)
            .with_span(span("Part One", 18.0, 1, 72.0))
            .with_span(span("Part Two", 18.0, 1, 200.0))
            .with_span(span(&"Body text between the parts. ".repeat(4), 12.0, 1, 230.0));

        let result = classify(&[page], &ClassifyOptions::default());
        assert_eq!(result.pages[0].blocks[0], ContentBlock::heading(1, "Part One"));
        assert_eq!(result.pages[0].blocks[1], ContentBlock::heading(1, "Part Two"));
    }

    #[test]
    fn test_different_fonts_not_merged() {
        let page = PageContent::letter(1)
            .with_span(span("plain words here", 12.0, 1, 100.0))
            .with_span(TextSpan::new("italic words", 12.0, "Helvetica-Oblique", 1, 114.0));

        let result = classify(&[page], &ClassifyOptions::default());
        assert_eq!(result.pages[0].blocks.len(), 2);
    }

    #[test]
    fn test_drops_page_numbers_and_decoration() {
        let page = PageContent::letter(1)
            .with_span(span("Real text", 12.0, 1, 100.0))
            .with_span(span("* * *", 12.0, 1, 300.0))
            .with_span(span("   ", 12.0, 1, 400.0))
            .with_span(span("- 7 -", 12.0, 1, 760.0))
            .with_span(span("Page 7 of 9", 12.0, 1, 770.0));

        let result = classify(&[page.clone()], &ClassifyOptions::default());
        assert_eq!(result.pages[0].blocks, vec![ContentBlock::paragraph("Real text")]);
        assert_eq!(result.dropped_spans, 4);

        let keep = ClassifyOptions::new().with_page_numbers_dropped(false);
        let result = classify(&[page], &keep);
        assert_eq!(result.dropped_spans, 2);
    }

    #[test]
    fn test_running_header_dropped() {
        let pages: Vec<PageContent> = (1..=3)
            .map(|n| {
                PageContent::letter(n)
                    .with_span(span("ACME Annual Report", 10.0, n, 30.0 + n as f32 * 0.5))
                    .with_span(span(&format!("Body of page {n} with plenty of words."), 12.0, n, 200.0))
            })
            .collect();

        let result = classify(&pages, &ClassifyOptions::default());
        assert_eq!(result.dropped_spans, 3);
        for page in &result.pages {
            assert_eq!(page.blocks.len(), 1);
        }

        // Two pages are not enough.
        let result = classify(&pages[..2], &ClassifyOptions::default());
        assert_eq!(result.dropped_spans, 0);
    }

    #[test]
    fn test_same_text_elsewhere_not_header() {
        let pages: Vec<PageContent> = (1..=3)
            .map(|n| {
                PageContent::letter(n)
                    .with_span(span("Summary", 12.0, n, 100.0 * n as f32))
                    .with_span(span(&format!("Body text for page {n} goes here."), 12.0, n, 400.0))
            })
            .collect();
        let result = classify(&pages, &ClassifyOptions::default());
        assert_eq!(result.dropped_spans, 0);
    }

    #[test]
    fn test_tables_and_charts_interleaved_by_position() {
        let page = PageContent::letter(1)
            .with_span(span("Above the table.", 12.0, 1, 100.0))
            .with_span(span("Below everything.", 12.0, 1, 500.0))
            .with_table(TableBlock::from_strs(&[&["a", "b"]], 1, 200.0))
            .with_image(ImageBlock::new(BoundingBox::new(72.0, 300.0, 300.0, 450.0), 1));

        let result = classify(&[page], &ClassifyOptions::default());
        assert_eq!(
            result.pages[0].blocks,
            vec![
                ContentBlock::paragraph("Above the table."),
                ContentBlock::table(vec![vec!["a".into(), "b".into()]]),
                ContentBlock::Chart,
                ContentBlock::paragraph("Below everything."),
            ]
        );
    }

    #[test]
    fn test_invalid_size_warns() {
        let page = PageContent::letter(1)
            .with_span(span("Body text here", 12.0, 1, 100.0))
            .with_span(span("Broken", f32::NAN, 1, 200.0));

        let result = classify(&[page], &ClassifyOptions::default());
        assert_eq!(result.pages[0].blocks[1], ContentBlock::paragraph("Broken"));
        assert!(matches!(
            &result.warnings[0],
            Warning::Classification { page: 1, text, .. } if text == "Broken"
        ));
    }

    #[test]
    fn test_long_heading_sized_text_warns() {
        let long = "word ".repeat(10);
        let page = PageContent::letter(1)
            .with_span(span(&long, 18.0, 1, 72.0))
            .with_span(span(&"body ".repeat(40), 12.0, 1, 120.0));

        let options = ClassifyOptions::new().with_max_heading_chars(20);
        let result = classify(&[page], &options);
        assert!(!result.pages[0].blocks[0].is_heading());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_join_paragraph() {
        let mut text = String::from("well-");
        join_paragraph(&mut text, "known");
        assert_eq!(text, "well-\nknown");

        let mut text = String::from("pages 3-");
        join_paragraph(&mut text, "4");
        assert_eq!(text, "pages 3- 4");

        let mut text = String::from("end ");
        join_paragraph(&mut text, " start");
        assert_eq!(text, "end start");
    }
}
