//! End-to-end extraction pipeline.
//!
//! Extraction runs in two passes over one document: the font profile needs
//! every span before any span can be classified. Everything after that is a
//! single forward pass: classify, normalize, nest, assemble.

use std::io::Read;
use std::path::Path;

use rayon::prelude::*;

use crate::analysis::{BlockClassifier, ClassifyOptions, FontProfile, ProfileOptions};
use crate::error::Result;
use crate::model::{ContentBlock, PageContent};
use crate::normalize::{normalize_table, TextNormalizer};
use crate::parser::{ContentExtractor, PageSelection, ParseOptions, PdfParser};
use crate::render::{Extraction, ExtractionStats, JsonFormat};
use crate::structure::{DocumentAssembler, HierarchyBuilder};

/// All pipeline options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Page content extraction
    pub parse: ParseOptions,
    /// Heading level inference
    pub profile: ProfileOptions,
    /// Block classification
    pub classify: ClassifyOptions,
    /// JSON output format
    pub format: JsonFormat,
}

impl Options {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extraction options.
    pub fn with_parse(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    /// Set profile options.
    pub fn with_profile(mut self, profile: ProfileOptions) -> Self {
        self.profile = profile;
        self
    }

    /// Set classifier options.
    pub fn with_classify(mut self, classify: ClassifyOptions) -> Self {
        self.classify = classify;
        self
    }

    /// Set the JSON format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Restrict extraction to some pages.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.parse.pages = pages;
        self
    }
}

/// Runs extraction, classification, normalization and nesting for one
/// document at a time. A pipeline holds no per-document state and can be
/// reused.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: Options,
    normalizer: TextNormalizer,
}

impl Pipeline {
    /// Create a pipeline.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            normalizer: TextNormalizer::new(),
        }
    }

    /// The options in use.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Process a PDF file. The file is read and closed before analysis starts.
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<Extraction> {
        let path = path.as_ref();
        let parser = PdfParser::open_with_options(path, self.options.parse.clone())?;
        self.run(&parser, Some(path.display().to_string()))
    }

    /// Process an in-memory PDF.
    pub fn process_bytes(&self, data: &[u8]) -> Result<Extraction> {
        let parser = PdfParser::from_bytes_with_options(data, self.options.parse.clone())?;
        self.run(&parser, None)
    }

    /// Process a PDF from a reader.
    pub fn process_reader<R: Read>(&self, reader: R) -> Result<Extraction> {
        let parser = PdfParser::from_reader_with_options(reader, self.options.parse.clone())?;
        self.run(&parser, None)
    }

    /// Process pages that were extracted elsewhere.
    pub fn process_pages(&self, pages: Vec<PageContent>) -> Result<Extraction> {
        self.run(&pages, None)
    }

    /// Extract from any source and build the tree.
    pub fn run<E: ContentExtractor + ?Sized>(
        &self,
        extractor: &E,
        source: Option<String>,
    ) -> Result<Extraction> {
        let pages = extractor.extract()?;
        Ok(self.build(&pages, extractor.page_count(), source))
    }

    /// Font profile of a source, without building a tree.
    pub fn profile<E: ContentExtractor + ?Sized>(&self, extractor: &E) -> Result<FontProfile> {
        let pages = extractor.extract()?;
        Ok(FontProfile::analyze(
            pages.iter().flat_map(|p| &p.spans),
            &self.options.profile,
        ))
    }

    fn build(&self, pages: &[PageContent], total_pages: u32, source: Option<String>) -> Extraction {
        let profile = FontProfile::analyze(pages.iter().flat_map(|p| &p.spans), &self.options.profile);
        let classification = BlockClassifier::new(&profile, &self.options.classify).classify(pages);

        let mut warnings = classification.warnings;
        let mut builder = HierarchyBuilder::new();

        for page in classification.pages {
            builder.begin_page(page.page);
            for block in page.blocks {
                let block = match block {
                    ContentBlock::Heading { level, text } => {
                        ContentBlock::heading(level, self.normalizer.normalize(&text))
                    }
                    ContentBlock::Paragraph { text } => {
                        ContentBlock::paragraph(self.normalizer.normalize(&text))
                    }
                    ContentBlock::Table { rows } => {
                        let table = normalize_table(&rows, page.page);
                        if let Some(warning) = table.warning {
                            log::warn!("{}", warning);
                            warnings.push(warning);
                        }
                        ContentBlock::table(table.rows)
                    }
                    ContentBlock::Chart => ContentBlock::Chart,
                };
                builder.push(block);
            }
        }

        let mut assembler = DocumentAssembler::new(total_pages);
        if let Some(source) = source {
            assembler = assembler.with_source(source);
        }
        let tree = assembler.assemble(builder.finish());

        let mut stats = ExtractionStats::from_tree(&tree);
        stats.dropped_span_count = classification.dropped_spans as u32;
        stats.warning_count = warnings.len() as u32;

        log::info!(
            "Extracted {} pages: {} sections, {} paragraphs, {} tables, {} charts",
            stats.page_count,
            stats.section_count,
            stats.paragraph_count,
            stats.table_count,
            stats.chart_count
        );

        Extraction {
            tree,
            warnings,
            stats,
        }
    }
}

/// Process several files in parallel, one independent pipeline run per
/// file. Results are returned in input order.
pub fn process_files<P>(paths: &[P], options: &Options) -> Vec<Result<Extraction>>
where
    P: AsRef<Path> + Sync,
{
    let pipeline = Pipeline::new(options.clone());
    paths
        .par_iter()
        .map(|path| pipeline.process_file(path))
        .collect()
}
