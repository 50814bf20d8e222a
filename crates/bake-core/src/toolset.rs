use crate::error::Result;
use crate::expr::ExprPath;
use crate::model::{Module, Target};

/// Toolset-specific hooks consumed by path normalization. A toolset
/// encapsulates everything about one family of generated output
/// (makefiles, project files); only its build-directory resolution is
/// visible to this core.
pub trait Toolset: Send + Sync {
    fn name(&self) -> &'static str;

    /// Build directory for `target`, as a path anchored at anything
    /// other than [`crate::expr::Anchor::Builddir`].
    fn builddir_for(&self, module: &Module, target: &Target) -> Result<ExprPath>;
}
