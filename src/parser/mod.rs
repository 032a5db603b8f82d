//! Page content extraction.

pub mod backend;
mod layout;
mod options;
mod pdf_parser;
mod table_detector;

pub use backend::{LopdfBackend, PdfBackend};
pub use layout::{detect_columns, group_into_lines, Column, ContentInterpreter, GlyphRun, PageLayout, TextLine};
pub use options::{PageSelection, ParseOptions};
pub use pdf_parser::{extract_pages, ContentExtractor, PdfParser};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig};
