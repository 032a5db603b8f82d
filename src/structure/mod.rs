//! Section hierarchy and document assembly.

mod assembler;
mod hierarchy;

pub use assembler::DocumentAssembler;
pub use hierarchy::HierarchyBuilder;
