use std::collections::HashSet;

use bake_core::error::{Error, Result};
use bake_core::expr::{Expr, ExprReference, Visitor};
use bake_core::model::{Project, VarId};
use tracing::debug;

/// Verifies that recursive self-referencing loops (e.g. `foo = $(foo)`)
/// don't exist; they would cause infinite expansion downstream.
///
/// Walks the reference graph implied by variable values depth-first.
/// Stack membership detects a cycle regardless of its length; the
/// checked set bounds total work to O(variables + edges).
pub fn detect_self_references(project: &Project) -> Result<()> {
    debug!("checking for self-references");
    let mut checker = SelfRefChecker {
        project,
        stack: Vec::new(),
        checked: HashSet::new(),
    };
    for id in project.all_variables() {
        checker.check(id)?;
    }
    Ok(())
}

struct SelfRefChecker<'a> {
    project: &'a Project,
    /// Variables currently being expanded.
    stack: Vec<VarId>,
    /// Variables fully checked, never re-entered.
    checked: HashSet<VarId>,
}

impl SelfRefChecker<'_> {
    fn check(&mut self, id: VarId) -> Result<()> {
        if self.checked.contains(&id) {
            return Ok(());
        }
        let project = self.project;
        self.stack.push(id);
        let result = self.visit(&project.var(id).value);
        self.stack.pop();
        result?;
        self.checked.insert(id);
        Ok(())
    }
}

impl Visitor for SelfRefChecker<'_> {
    fn reference(&mut self, e: &Expr, r: &ExprReference) -> Result<()> {
        let Some(id) = self.project.resolve_ref(r) else {
            // reference to the default value of a property
            return Ok(());
        };
        if self.stack.contains(&id) {
            return Err(Error::SelfReference {
                name: self.project.var(id).name.clone(),
                span: e.span,
            });
        }
        self.check(id)
    }
}
