use std::collections::HashMap;
use std::path::Path as FsPath;

use bake_core::bail;
use bake_core::error::{Error, Result};
use bake_core::expr::{Anchor, Expr, ExprKind, ExprPath, Rewriter};
use bake_core::model::{ModuleId, Project, ScopeRef, TargetId, VarId};
use bake_core::span::Span;
use bake_core::toolset::Toolset;
use tracing::debug;

/// Normalizes relative paths so that they are absolute. Paths relative
/// to `@srcdir` are rewritten in terms of `@top_srcdir`; paths relative
/// to `@builddir` are translated through the toolset. This is needed so
/// that cross-module variable and path uses produce correct results.
///
/// A context must be set with [`PathsNormalizer::set_context`] before
/// visiting any expression; `@builddir` can only be translated with a
/// target context.
pub struct PathsNormalizer<'a> {
    project: &'a Project,
    toolset: Option<&'a dyn Toolset>,
    context: Option<ScopeRef>,
    // Both lookups are invariant within one pass run and expensive to
    // recompute, hence cached per scope. The cache lives and dies with
    // this normalizer.
    src_prefixes: HashMap<ModuleId, Option<Vec<Expr>>>,
    builddirs: HashMap<(ModuleId, TargetId), ExprPath>,
}

impl<'a> PathsNormalizer<'a> {
    pub fn new(project: &'a Project, toolset: Option<&'a dyn Toolset>) -> Self {
        Self {
            project,
            toolset,
            context: None,
            src_prefixes: HashMap::new(),
            builddirs: HashMap::new(),
        }
    }

    /// Sets the scope to perform the translation in: a module, or a
    /// target within it.
    pub fn set_context(&mut self, context: ScopeRef) {
        self.context = Some(context);
    }

    /// Offset of `module`'s source directory from the top module's
    /// source directory, as literal path components; `None` when the
    /// two coincide.
    fn src_prefix(&mut self, module: ModuleId) -> &Option<Vec<Expr>> {
        if !self.src_prefixes.contains_key(&module) {
            let module_dir = source_dir(&self.project.module(module).source_file);
            let top_dir = source_dir(&self.project.top_module().source_file);
            let offset = dir_offset(top_dir, module_dir);
            debug!(
                module = %self.project.module(module).source_file.display(),
                prefix = ?offset,
                "translating paths",
            );
            let prefix = offset.map(|segments| {
                segments
                    .into_iter()
                    .map(|segment| Expr::literal(segment, Span::default()))
                    .collect()
            });
            self.src_prefixes.insert(module, prefix);
        }
        &self.src_prefixes[&module]
    }

    fn builddir(
        &mut self,
        toolset: &dyn Toolset,
        module: ModuleId,
        target: TargetId,
    ) -> Result<&ExprPath> {
        let key = (module, target);
        if !self.builddirs.contains_key(&key) {
            let module_ref = self.project.module(module);
            let target_ref = module_ref.target(target);
            let builddir = toolset.builddir_for(module_ref, target_ref)?;
            if builddir.anchor == Anchor::Builddir {
                bail!(
                    "toolset \"{}\" returned a @builddir-anchored build directory for target \"{}\"",
                    toolset.name(),
                    target_ref.name
                );
            }
            debug!(
                target = %target_ref.name,
                builddir = %builddir.anchor,
                "translating @builddir paths",
            );
            self.builddirs.insert(key, builddir);
        }
        Ok(&self.builddirs[&key])
    }
}

impl Rewriter for PathsNormalizer<'_> {
    fn path(&mut self, span: Span, p: ExprPath) -> Result<Expr> {
        // Components may themselves contain nested path expressions.
        let mut components = self.rewrite_all(p.components)?;
        let mut anchor = p.anchor;

        let Some(context) = self.context else {
            return Err(Error::Context {
                message: "path expression visited without a scope context".to_string(),
                span,
            });
        };

        if anchor == Anchor::Builddir {
            if let Some(toolset) = self.toolset {
                let Some(target) = context.target else {
                    return Err(Error::Context {
                        message: "@builddir references are not allowed outside of targets"
                            .to_string(),
                        span,
                    });
                };
                let builddir = self.builddir(toolset, context.module, target)?.clone();
                anchor = builddir.anchor;
                let mut merged = builddir.components;
                merged.extend(components);
                components = merged;
            }
            // With no toolset, @builddir stays unresolved and is left to
            // toolset-specific generation.
        }

        if anchor == Anchor::Srcdir {
            if let Some(prefix) = self.src_prefix(context.module).clone() {
                let mut merged = prefix;
                merged.extend(components);
                components = merged;
            }
            anchor = Anchor::TopSrcdir;
        }

        Ok(Expr::new(ExprKind::Path(ExprPath { anchor, components }), span))
    }
}

fn source_dir(source_file: &FsPath) -> &FsPath {
    source_file.parent().unwrap_or_else(|| FsPath::new(""))
}

/// Relative offset of `to` from `from`, as path segments; `None` when
/// the directories coincide. Pure directory math, no filesystem access.
fn dir_offset(from: &FsPath, to: &FsPath) -> Option<Vec<String>> {
    let from: Vec<_> = from.components().collect();
    let to: Vec<_> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments = Vec::new();
    for _ in common..from.len() {
        segments.push("..".to_string());
    }
    for component in &to[common..] {
        segments.push(component.as_os_str().to_string_lossy().into_owned());
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// Normalizes relative paths for the whole model, visiting every
/// variable of every module and every target with the matching context.
pub fn normalize_paths_in_model(
    project: &mut Project,
    toolset: Option<&dyn Toolset>,
) -> Result<()> {
    debug!("translating relative paths into absolute");

    let mut scoped: Vec<(ScopeRef, VarId)> = Vec::new();
    for (module_id, module) in project.modules() {
        let scope = ScopeRef::module(module_id);
        scoped.extend(module.variables().map(|id| (scope, id)));
        for (target_id, target) in module.targets() {
            let scope = ScopeRef::target(module_id, target_id);
            scoped.extend(target.variables().map(|id| (scope, id)));
        }
    }

    // Path rewriting reads module/target structure but never variable
    // values, so all values can be taken out before visiting.
    let taken: Vec<(ScopeRef, VarId, Expr)> = scoped
        .into_iter()
        .map(|(scope, id)| {
            let value = project.take_value(id);
            (scope, id, value)
        })
        .collect();

    let mut rewritten = Vec::with_capacity(taken.len());
    {
        let mut normalizer = PathsNormalizer::new(project, toolset);
        for (scope, id, value) in taken {
            normalizer.set_context(scope);
            rewritten.push((id, normalizer.rewrite(value)?));
        }
    }
    for (id, value) in rewritten {
        project.set_value(id, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bake_core::model::{Module, Target};
    use bake_core::vartypes;
    use pretty_assertions::assert_eq;

    fn span() -> Span {
        Span::default()
    }

    struct FakeToolset;

    impl Toolset for FakeToolset {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn builddir_for(&self, _module: &Module, target: &Target) -> Result<ExprPath> {
            Ok(ExprPath {
                anchor: Anchor::TopSrcdir,
                components: vec![
                    Expr::literal("build", span()),
                    Expr::literal(target.name.clone(), span()),
                ],
            })
        }
    }

    #[test]
    fn srcdir_is_reanchored_with_module_offset() {
        let mut project = Project::new();
        let top = project.add_module("project/module.bkl");
        let sub = project.add_module("project/sub/dir/module.bkl");
        assert_eq!(top, 0);

        let id = project.define(
            ScopeRef::module(sub),
            "src",
            vartypes::path(),
            Expr::path(
                Anchor::Srcdir,
                vec![Expr::literal("foo.c", span())],
                span(),
            ),
        );

        normalize_paths_in_model(&mut project, None).unwrap();
        assert_eq!(
            project.var(id).value.to_string(),
            "@top_srcdir/sub/dir/foo.c"
        );
    }

    #[test]
    fn top_module_paths_keep_their_components() {
        let mut project = Project::new();
        let top = project.add_module("project/module.bkl");
        let id = project.define(
            ScopeRef::module(top),
            "src",
            vartypes::path(),
            Expr::path(
                Anchor::Srcdir,
                vec![Expr::literal("foo.c", span())],
                span(),
            ),
        );

        normalize_paths_in_model(&mut project, None).unwrap();
        assert_eq!(project.var(id).value.to_string(), "@top_srcdir/foo.c");
    }

    #[test]
    fn builddir_is_translated_through_the_toolset() {
        let mut project = Project::new();
        let module = project.add_module("project/module.bkl");
        let target = project.add_target(module, "prog");
        let id = project.define(
            ScopeRef::target(module, target),
            "objdir",
            vartypes::path(),
            Expr::path(
                Anchor::Builddir,
                vec![Expr::literal("obj", span())],
                span(),
            ),
        );

        normalize_paths_in_model(&mut project, Some(&FakeToolset)).unwrap();
        assert_eq!(
            project.var(id).value.to_string(),
            "@top_srcdir/build/prog/obj"
        );
    }

    #[test]
    fn builddir_outside_target_is_a_context_error() {
        let mut project = Project::new();
        let module = project.add_module("project/module.bkl");
        project.define(
            ScopeRef::module(module),
            "objdir",
            vartypes::path(),
            Expr::path(Anchor::Builddir, vec![], span()),
        );

        let err = normalize_paths_in_model(&mut project, Some(&FakeToolset)).unwrap_err();
        assert!(matches!(err, Error::Context { .. }));
    }

    #[test]
    fn builddir_without_toolset_is_left_unresolved() {
        let mut project = Project::new();
        let module = project.add_module("project/module.bkl");
        let id = project.define(
            ScopeRef::module(module),
            "objdir",
            vartypes::path(),
            Expr::path(
                Anchor::Builddir,
                vec![Expr::literal("obj", span())],
                span(),
            ),
        );

        normalize_paths_in_model(&mut project, None).unwrap();
        assert_eq!(project.var(id).value.to_string(), "@builddir/obj");
    }

    #[test]
    fn offsets_walk_up_as_well_as_down() {
        assert_eq!(
            dir_offset(FsPath::new("a/b"), FsPath::new("a/c/d")),
            Some(vec!["..".to_string(), "c".to_string(), "d".to_string()])
        );
        assert_eq!(dir_offset(FsPath::new("a/b"), FsPath::new("a/b")), None);
    }
}
