// bake-passes: semantic-analysis and optimization passes run between
// model construction and code generation.
//
// Architecture:
// - passes: focused passes, each a free function over the whole model
// - pipeline: the fixed-order driver sequencing them

pub mod passes;
pub mod pipeline;

// Re-export key types for convenience
pub use passes::*;
pub use pipeline::{Pass, PassContext, Pipeline};
