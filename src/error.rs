//! Error and warning types for pdftree.

use std::io;
use thiserror::Error;

/// Result type alias for pdftree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Any of these aborts the run and no output is written.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted or password-protected.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// The document has no extractable pages.
    #[error("Document contains no extractable pages")]
    NoPages,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error while serializing the tree.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether this error means the document itself could not be extracted
    /// (unreadable, encrypted, corrupted or empty).
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::PdfParse(_)
                | Error::Encrypted
                | Error::Corrupted(_)
                | Error::NoPages
                | Error::PageOutOfRange(..)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

/// Recoverable conditions found while building the tree.
///
/// Warnings never abort a run; the pipeline applies a fallback and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Warning {
    /// A span could not be confidently classified and was kept as a paragraph.
    #[error("page {page}: classified as paragraph ({reason}): {text:?}")]
    Classification {
        page: u32,
        text: String,
        reason: String,
    },

    /// A table had rows of differing widths and was padded.
    #[error("page {page}: ragged table padded to {expected_columns} columns ({ragged_rows} of {rows} rows short)")]
    TableGeometry {
        page: u32,
        rows: usize,
        expected_columns: usize,
        ragged_rows: usize,
    },
}

impl Warning {
    /// Page the warning refers to.
    pub fn page(&self) -> u32 {
        match self {
            Warning::Classification { page, .. } | Warning::TableGeometry { page, .. } => *page,
        }
    }
}
