//! Data model shared by every pipeline stage.
//!
//! Raw page content ([`TextSpan`], [`TableBlock`], [`ImageBlock`]) comes out of
//! the extractor, [`ContentBlock`]s come out of the classifier, and the
//! serializable [`DocumentTree`] comes out of the assembler. All values are
//! built once and never mutated after being handed to the next stage.

mod block;
mod content;
mod tree;

pub use block::ContentBlock;
pub use content::{BoundingBox, ImageBlock, PageContent, TableBlock, TextSpan};
pub use tree::{DocumentTree, Node, PageTree, Section};
