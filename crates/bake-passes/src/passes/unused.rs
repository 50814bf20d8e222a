use std::collections::HashSet;

use bake_core::diagnostics::{Diagnostic, DiagnosticManager};
use bake_core::error::Result;
use bake_core::expr::{Expr, ExprReference, Visitor};
use bake_core::model::{Project, VarId};
use tracing::warn;

/// Warns about unused variables -- they may indicate typos.
///
/// Properties are exempt: their consumption happens inside the toolset
/// and is not expressible as a reference in this IR.
pub fn detect_unused_vars(project: &Project, diagnostics: &mut DiagnosticManager) -> Result<()> {
    let mut checker = VariablesChecker {
        project,
        found: HashSet::new(),
    };
    for id in project.all_variables() {
        checker.visit(&project.var(id).value)?;
    }
    let used = checker.found;

    for id in project.all_variables() {
        let var = project.var(id);
        if !var.is_property && !used.contains(&id) {
            warn!(variable = %var.name, "variable is never used");
            diagnostics.add_diagnostic(
                Diagnostic::warning(format!("variable \"{}\" is never used", var.name))
                    .with_span(var.value.span),
            );
        }
    }
    Ok(())
}

struct VariablesChecker<'a> {
    project: &'a Project,
    found: HashSet<VarId>,
}

impl Visitor for VariablesChecker<'_> {
    fn reference(&mut self, _e: &Expr, r: &ExprReference) -> Result<()> {
        if let Some(id) = self.project.resolve_ref(r) {
            if !self.project.var(id).is_property {
                self.found.insert(id);
            }
        }
        Ok(())
    }
}
