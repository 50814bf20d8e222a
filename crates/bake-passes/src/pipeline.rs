use std::sync::Arc;

use bake_core::diagnostics::DiagnosticManager;
use bake_core::error::Result;
use bake_core::model::Project;
use bake_core::registry::ExtensionRegistry;
use bake_core::toolset::Toolset;
use tracing::debug;

use crate::passes;

/// State threaded through the pipeline: the optional toolset consumed
/// by path normalization, and the warnings collected along the way.
/// Passes otherwise communicate only through the model.
pub struct PassContext {
    pub toolset: Option<Arc<dyn Toolset>>,
    pub diagnostics: DiagnosticManager,
}

impl PassContext {
    pub fn new(toolset: Option<Arc<dyn Toolset>>) -> Self {
        Self {
            toolset,
            diagnostics: DiagnosticManager::new(),
        }
    }
}

/// One step of the pipeline. Passes mutate variable values in place and
/// report findings through the context; a returned error aborts the
/// remaining passes for the run.
pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&self, project: &mut Project, ctx: &mut PassContext) -> Result<()>;
}

struct DetectSelfReferences;

impl Pass for DetectSelfReferences {
    fn name(&self) -> &'static str {
        "detect-self-references"
    }
    fn run(&self, project: &mut Project, _ctx: &mut PassContext) -> Result<()> {
        passes::detect_self_references(project)
    }
}

struct DetectUnusedVars;

impl Pass for DetectUnusedVars {
    fn name(&self) -> &'static str {
        "detect-unused-vars"
    }
    fn run(&self, project: &mut Project, ctx: &mut PassContext) -> Result<()> {
        passes::detect_unused_vars(project, &mut ctx.diagnostics)
    }
}

struct NormalizeAndValidateVars;

impl Pass for NormalizeAndValidateVars {
    fn name(&self) -> &'static str {
        "normalize-and-validate-vars"
    }
    fn run(&self, project: &mut Project, _ctx: &mut PassContext) -> Result<()> {
        passes::normalize_and_validate_vars(project)
    }
}

struct NormalizePaths;

impl Pass for NormalizePaths {
    fn name(&self) -> &'static str {
        "normalize-paths"
    }
    fn run(&self, project: &mut Project, ctx: &mut PassContext) -> Result<()> {
        passes::normalize_paths_in_model(project, ctx.toolset.as_deref())
    }
}

struct SimplifyExprs;

impl Pass for SimplifyExprs {
    fn name(&self) -> &'static str {
        "simplify-exprs"
    }
    fn run(&self, project: &mut Project, _ctx: &mut PassContext) -> Result<()> {
        passes::simplify_exprs(project)
    }
}

struct EliminateSuperfluousConditionals;

impl Pass for EliminateSuperfluousConditionals {
    fn name(&self) -> &'static str {
        "eliminate-superfluous-conditionals"
    }
    fn run(&self, project: &mut Project, _ctx: &mut PassContext) -> Result<()> {
        passes::eliminate_superfluous_conditionals(project)
    }
}

/// Ordered list of passes. Later passes rely on invariants established
/// by earlier ones (normalization before validation, self-reference
/// detection before simplification), so the standard order is fixed.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    pub fn standard() -> Self {
        Self {
            passes: vec![
                Box::new(DetectSelfReferences),
                Box::new(DetectUnusedVars),
                Box::new(NormalizeAndValidateVars),
                Box::new(NormalizePaths),
                Box::new(SimplifyExprs),
                Box::new(EliminateSuperfluousConditionals),
            ],
        }
    }

    pub fn run(&self, project: &mut Project, ctx: &mut PassContext) -> Result<()> {
        for pass in &self.passes {
            debug!(pass = pass.name(), "running pass");
            pass.run(project, ctx)?;
        }
        Ok(())
    }
}

/// Looks the named toolset up in the registry; `None` means "no
/// toolset", leaving `@builddir` paths unresolved.
pub fn toolset_from_registry(
    registry: &ExtensionRegistry<dyn Toolset>,
    name: Option<&str>,
) -> Result<Option<Arc<dyn Toolset>>> {
    name.map(|name| registry.get(name)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bake_core::error::Error;
    use bake_core::expr::ExprPath;
    use bake_core::model::{Module, Target};

    struct NullToolset;

    impl Toolset for NullToolset {
        fn name(&self) -> &'static str {
            "null"
        }
        fn builddir_for(&self, _module: &Module, _target: &Target) -> Result<ExprPath> {
            Err(Error::Generic("no builddir".to_string()))
        }
    }

    #[test]
    fn toolset_lookup_goes_through_the_registry() {
        let mut registry: ExtensionRegistry<dyn Toolset> = ExtensionRegistry::new("toolset");
        registry.register("null", Arc::new(NullToolset)).unwrap();

        assert!(toolset_from_registry(&registry, None).unwrap().is_none());
        let found = toolset_from_registry(&registry, Some("null")).unwrap();
        assert_eq!(found.unwrap().name(), "null");
        assert!(toolset_from_registry(&registry, Some("gnu")).is_err());
    }

    #[test]
    fn standard_order_is_fixed() {
        let names: Vec<_> = Pipeline::standard()
            .passes
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "detect-self-references",
                "detect-unused-vars",
                "normalize-and-validate-vars",
                "normalize-paths",
                "simplify-exprs",
                "eliminate-superfluous-conditionals",
            ]
        );
    }
}
