//! Text and table normalization.

mod table;
mod text;

pub use table::{normalize_table, NormalizedTable};
pub use text::TextNormalizer;
