pub mod paths;
pub mod self_refs;
pub mod simplify;
pub mod types;
pub mod unused;

pub use paths::{normalize_paths_in_model, PathsNormalizer};
pub use self_refs::detect_self_references;
pub use simplify::{
    eliminate_superfluous_conditionals, simplify_exprs, BasicSimplifier, ConditionalsSimplifier,
};
pub use types::normalize_and_validate_vars;
pub use unused::detect_unused_vars;
