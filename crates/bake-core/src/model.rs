use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::expr::{Expr, ExprReference};
use crate::span::Span;
use crate::vartypes::VarType;

pub type ModuleId = u32;
pub type TargetId = u32;
pub type VarId = u32;

/// Lexical position a `Reference` resolves from: a module, or a target
/// within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ScopeRef {
    pub module: ModuleId,
    pub target: Option<TargetId>,
}

impl ScopeRef {
    pub fn module(module: ModuleId) -> Self {
        Self {
            module,
            target: None,
        }
    }

    pub fn target(module: ModuleId, target: TargetId) -> Self {
        Self {
            module,
            target: Some(target),
        }
    }
}

/// A typed variable holding an expression tree. Passes mutate `value`
/// and nothing else.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub value: Expr,
    pub ty: Arc<dyn VarType>,
    /// Toolset-injected properties are exempt from unused-variable
    /// warnings; a reference to a property without an explicit binding
    /// resolves to nothing ("use the type's default").
    pub is_property: bool,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    variables: BTreeMap<String, VarId>,
}

impl Target {
    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.variables.values().copied()
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub source_file: PathBuf,
    variables: BTreeMap<String, VarId>,
    targets: Vec<Target>,
}

impl Module {
    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.variables.values().copied()
    }

    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, t)| (i as TargetId, t))
    }

    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id as usize]
    }
}

/// The whole in-memory model: a module hierarchy plus a project-wide
/// variable arena indexed by [`VarId`]. Fully constructed by the
/// external parser before any pass runs.
#[derive(Debug, Clone, Default)]
pub struct Project {
    modules: Vec<Module>,
    vars: Vec<Variable>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, source_file: impl Into<PathBuf>) -> ModuleId {
        let id = self.modules.len() as ModuleId;
        self.modules.push(Module {
            source_file: source_file.into(),
            variables: BTreeMap::new(),
            targets: Vec::new(),
        });
        id
    }

    pub fn add_target(&mut self, module: ModuleId, name: impl Into<String>) -> TargetId {
        let module = &mut self.modules[module as usize];
        let id = module.targets.len() as TargetId;
        module.targets.push(Target {
            name: name.into(),
            variables: BTreeMap::new(),
        });
        id
    }

    /// Defines a free-form variable in `scope`.
    pub fn define(
        &mut self,
        scope: ScopeRef,
        name: impl Into<String>,
        ty: Arc<dyn VarType>,
        value: Expr,
    ) -> VarId {
        self.insert(scope, name.into(), ty, value, false)
    }

    /// Defines a toolset property in `scope`. A property without a
    /// default gets no variable at all; references to it legitimately
    /// fail to resolve.
    pub fn define_property(
        &mut self,
        scope: ScopeRef,
        name: impl Into<String>,
        ty: Arc<dyn VarType>,
        default: Option<Expr>,
    ) -> Option<VarId> {
        default.map(|value| self.insert(scope, name.into(), ty, value, true))
    }

    fn insert(
        &mut self,
        scope: ScopeRef,
        name: String,
        ty: Arc<dyn VarType>,
        value: Expr,
        is_property: bool,
    ) -> VarId {
        let id = self.vars.len() as VarId;
        self.vars.push(Variable {
            name: name.clone(),
            value,
            ty,
            is_property,
        });
        let module = &mut self.modules[scope.module as usize];
        let table = match scope.target {
            Some(target) => &mut module.targets[target as usize].variables,
            None => &mut module.variables,
        };
        table.insert(name, id);
        id
    }

    /// The project's top-level module; the model always has one.
    pub fn top_module(&self) -> &Module {
        &self.modules[0]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id as usize]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (i as ModuleId, m))
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id as usize]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.vars[id as usize]
    }

    /// Every variable in the model, in definition order.
    pub fn all_variables(&self) -> impl Iterator<Item = VarId> {
        0..self.vars.len() as VarId
    }

    /// Resolves `name` in `scope`: the target's table first, then its
    /// owning module's. Returns `None` when no variable is bound, which
    /// callers must treat as "no variable", not an error.
    pub fn resolve(&self, scope: ScopeRef, name: &str) -> Option<VarId> {
        let module = self.modules.get(scope.module as usize)?;
        if let Some(target) = scope.target {
            if let Some(target) = module.targets.get(target as usize) {
                if let Some(&id) = target.variables.get(name) {
                    return Some(id);
                }
            }
        }
        module.variables.get(name).copied()
    }

    pub fn resolve_ref(&self, r: &ExprReference) -> Option<VarId> {
        self.resolve(r.context, &r.var)
    }

    /// Takes a variable's value out for rewriting, leaving a null
    /// placeholder. Pair with [`Project::set_value`].
    pub fn take_value(&mut self, id: VarId) -> Expr {
        let var = &mut self.vars[id as usize];
        std::mem::replace(&mut var.value, Expr::null(Span::default()))
    }

    pub fn set_value(&mut self, id: VarId, value: Expr) {
        self.vars[id as usize].value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vartypes;

    fn span() -> Span {
        Span::default()
    }

    #[test]
    fn target_scope_falls_back_to_module() {
        let mut project = Project::new();
        let module = project.add_module("project/module.bkl");
        let target = project.add_target(module, "prog");

        let in_module = project.define(
            ScopeRef::module(module),
            "defines",
            vartypes::any(),
            Expr::literal("FOO", span()),
        );
        let in_target = project.define(
            ScopeRef::target(module, target),
            "sources",
            vartypes::any(),
            Expr::literal("main.c", span()),
        );

        let scope = ScopeRef::target(module, target);
        assert_eq!(project.resolve(scope, "sources"), Some(in_target));
        assert_eq!(project.resolve(scope, "defines"), Some(in_module));
        assert_eq!(project.resolve(ScopeRef::module(module), "sources"), None);
        assert_eq!(project.resolve(scope, "missing"), None);
    }

    #[test]
    fn property_without_default_does_not_resolve() {
        let mut project = Project::new();
        let module = project.add_module("project/module.bkl");
        let scope = ScopeRef::module(module);

        assert_eq!(
            project.define_property(scope, "outputdir", vartypes::path(), None),
            None
        );
        assert_eq!(project.resolve(scope, "outputdir"), None);

        let id = project
            .define_property(
                scope,
                "archs",
                vartypes::any(),
                Some(Expr::literal("x86", span())),
            )
            .unwrap();
        assert_eq!(project.resolve(scope, "archs"), Some(id));
        assert!(project.var(id).is_property);
    }

    #[test]
    fn take_value_leaves_null_placeholder() {
        let mut project = Project::new();
        let module = project.add_module("project/module.bkl");
        let id = project.define(
            ScopeRef::module(module),
            "x",
            vartypes::any(),
            Expr::literal("1", span()),
        );

        let taken = project.take_value(id);
        assert_eq!(taken.as_literal(), Some("1"));
        assert!(project.var(id).value.is_null());

        project.set_value(id, taken);
        assert_eq!(project.var(id).value.as_literal(), Some("1"));
    }
}
