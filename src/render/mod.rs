//! Output rendering and extraction results.

mod json;
mod result;

pub use json::{to_json, JsonFormat};
pub use result::{Extraction, ExtractionStats};
