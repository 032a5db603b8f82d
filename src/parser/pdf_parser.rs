//! PDF page content extraction.

use std::io::Read;
use std::path::Path;

use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::{BoundingBox, ImageBlock, PageContent, TableBlock};

use super::backend::{LopdfBackend, PageId, PdfBackend};
use super::layout::{group_into_lines, ContentInterpreter};
use super::options::ParseOptions;
use super::table_detector::TableDetector;

/// Source of per-page raw content.
///
/// Implemented by [`PdfParser`]; tests and callers with their own decoder can
/// provide pages directly.
pub trait ContentExtractor {
    /// Page count of the whole source document.
    fn page_count(&self) -> u32;

    /// Extract every selected page, in ascending page order.
    fn extract(&self) -> Result<Vec<PageContent>>;
}

/// Pages supplied in memory.
impl ContentExtractor for Vec<PageContent> {
    fn page_count(&self) -> u32 {
        self.iter().map(|p| p.page).max().unwrap_or(0)
    }

    fn extract(&self) -> Result<Vec<PageContent>> {
        if self.is_empty() {
            return Err(Error::NoPages);
        }
        let mut pages = self.clone();
        pages.sort_by_key(|p| p.page);
        Ok(pages)
    }
}

/// PDF document parser.
pub struct PdfParser {
    backend: LopdfBackend,
    options: ParseOptions,
}

impl PdfParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = detect_format_from_path(path)?;
        log::debug!("Opening {} ({})", path.display(), format);

        let backend = LopdfBackend::load_file(path)?;
        Ok(Self { backend, options })
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        detect_format_from_bytes(data)?;
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self { backend, options })
    }

    /// Parse a PDF from a reader. The reader is consumed and dropped before
    /// parsing starts.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse a PDF from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        drop(reader);
        Self::from_bytes_with_options(&data, options)
    }

    /// PDF version string (e.g. "1.7").
    pub fn version(&self) -> String {
        self.backend.version()
    }

    /// The options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }
}

impl ContentExtractor for PdfParser {
    fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    fn extract(&self) -> Result<Vec<PageContent>> {
        extract_pages(&self.backend, &self.options)
    }
}

/// Extract the selected pages of any backend.
pub fn extract_pages<B: PdfBackend + ?Sized>(
    backend: &B,
    options: &ParseOptions,
) -> Result<Vec<PageContent>> {
    let pages = backend.pages();
    let total = pages.len() as u32;
    if total == 0 {
        return Err(Error::NoPages);
    }

    // An explicit page outside the document is a caller error.
    if let super::PageSelection::Pages(list) = &options.pages {
        if let Some(&bad) = list.iter().find(|&&p| p > total) {
            return Err(Error::PageOutOfRange(bad, total));
        }
    }

    let detector = TableDetector::with_config(options.table_config.clone());
    let mut result = Vec::new();

    for (&number, &page_id) in &pages {
        if !options.pages.includes(number) {
            continue;
        }
        result.push(extract_page(backend, number, page_id, options, &detector)?);
    }

    if result.is_empty() {
        return Err(Error::NoPages);
    }
    Ok(result)
}

fn extract_page<B: PdfBackend + ?Sized>(
    backend: &B,
    number: u32,
    page_id: PageId,
    options: &ParseOptions,
    detector: &TableDetector,
) -> Result<PageContent> {
    let (width, height) = backend.page_size(page_id);
    let mut page = PageContent::new(number, width, height);

    let layout = ContentInterpreter::new(backend, page_id)?.run()?;
    let mut runs = layout.runs;

    if options.detect_tables {
        let (tables, remaining) = detector.detect(runs);
        runs = remaining;
        page.tables = tables
            .into_iter()
            .map(|t| TableBlock::new(t.rows, number, height - (t.top_y + t.font_size)))
            .collect();
    }

    page.spans = group_into_lines(runs, options.detect_columns)
        .into_iter()
        .filter_map(|line| line.into_span(number, height))
        .collect();

    if options.detect_images {
        page.images = layout
            .images
            .into_iter()
            .map(|b| BoundingBox::new(b.x0, height - b.bottom, b.x1, height - b.top))
            .filter(|b| !b.is_empty())
            .map(|b| ImageBlock::new(b, number))
            .collect();
    }

    log::debug!(
        "Page {}: {} spans, {} tables, {} images",
        number,
        page.spans.len(),
        page.tables.len(),
        page.images.len()
    );
    Ok(page)
}
