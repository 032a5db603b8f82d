//! # pdftree
//!
//! Turns PDF documents into a hierarchical, typed JSON tree.
//!
//! Headings are inferred from font sizes alone: the size covering the most
//! characters is body text, and every larger size becomes a heading level.
//! Sections nest by level and keep collecting paragraphs, tables and charts
//! until a heading of the same or a higher rank closes them, across page
//! boundaries too.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdftree::{extract_file, to_json, JsonFormat};
//!
//! fn main() -> pdftree::Result<()> {
//!     let extraction = extract_file("document.pdf")?;
//!     println!("{}", to_json(&extraction.tree, JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Output
//!
//! ```json
//! {"source": "document.pdf", "total_pages": 1, "pages": [
//!   {"page": 1, "content": [
//!     {"type": "section", "title": "Chapter 1", "level": 1, "children": [
//!       {"type": "paragraph", "text": "Intro text."}
//!     ]}
//!   ]}
//! ]}
//! ```

pub mod analysis;
pub mod detect;
pub mod error;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod structure;

// Re-export commonly used types
pub use analysis::{ClassifyOptions, FontProfile, ProfileOptions};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf_bytes, PdfFormat};
pub use error::{Error, Result, Warning};
pub use model::{
    BoundingBox, ContentBlock, DocumentTree, ImageBlock, Node, PageContent, PageTree, Section,
    TableBlock, TextSpan,
};
pub use parser::{ContentExtractor, PageSelection, ParseOptions, PdfParser};
pub use pipeline::{process_files, Options, Pipeline};
pub use render::{to_json, Extraction, ExtractionStats, JsonFormat};

use std::io::Read;
use std::path::Path;

/// Extract a PDF file with default options.
///
/// # Example
///
/// ```no_run
/// let extraction = pdftree::extract_file("document.pdf").unwrap();
/// println!("Sections: {}", extraction.stats.section_count);
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Extraction> {
    Pipeline::default().process_file(path)
}

/// Extract a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdftree::{extract_file_with_options, Options, ProfileOptions};
///
/// let options = Options::new()
///     .with_profile(ProfileOptions::new().with_bold_promotion(Some(0.5)));
/// let extraction = extract_file_with_options("document.pdf", &options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(path: P, options: &Options) -> Result<Extraction> {
    Pipeline::new(options.clone()).process_file(path)
}

/// Extract a PDF held in memory.
pub fn extract_bytes(data: &[u8]) -> Result<Extraction> {
    Pipeline::default().process_bytes(data)
}

/// Extract a PDF from a reader.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
///
/// let file = File::open("document.pdf").unwrap();
/// let extraction = pdftree::extract_reader(file).unwrap();
/// ```
pub fn extract_reader<R: Read>(reader: R) -> Result<Extraction> {
    Pipeline::default().process_reader(reader)
}

/// Convert a PDF file straight to a JSON string.
pub fn to_json_string<P: AsRef<Path>>(path: P, options: &Options) -> Result<String> {
    let extraction = extract_file_with_options(path, options)?;
    to_json(&extraction.tree, options.format)
}

/// Convert a PDF file and write the JSON to `output`.
///
/// The JSON is rendered in full before the output file is created, so a
/// failed extraction leaves no file behind.
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &Options,
) -> Result<Extraction> {
    let extraction = extract_file_with_options(input, options)?;
    let json = to_json(&extraction.tree, options.format)?;
    std::fs::write(output, json)?;
    Ok(extraction)
}
