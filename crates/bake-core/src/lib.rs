#[macro_use]
pub mod macros;

pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod model;
pub mod registry;
pub mod span;
pub mod toolset;
pub mod vartypes;

// Re-export commonly used items for convenience
pub use tracing;

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
