use std::sync::Arc;

use bake_core::error::{Error, Result};
use bake_core::expr::{Anchor, BoolOp, Expr, ExprPath, Visitor};
use bake_core::model::{Module, Project, ScopeRef, Target};
use bake_core::span::Span;
use bake_core::toolset::Toolset;
use bake_core::vartypes;
use bake_passes::{PassContext, Pipeline};
use pretty_assertions::assert_eq;

fn span() -> Span {
    Span::default()
}

struct MakeToolset;

impl Toolset for MakeToolset {
    fn name(&self) -> &'static str {
        "make"
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

/// A project spanning two modules with a target, exercising every pass:
/// list coercion, srcdir re-anchoring, builddir translation, reference
/// aliasing and a statically-decidable conditional.
fn sample_project() -> Project {
    let mut project = Project::new();
    let top = project.add_module("project/module.bkl");
    let sub = project.add_module("project/sub/dir/module.bkl");
    let top_scope = ScopeRef::module(top);
    let sub_scope = ScopeRef::module(sub);

    project.define(
        top_scope,
        "variant",
        vartypes::string(),
        Expr::literal("release", span()),
    );
    project.define(
        top_scope,
        "flags",
        vartypes::string(),
        Expr::if_(
            Expr::bool_op(
                BoolOp::Equal,
                vec![
                    Expr::reference("variant", top_scope, span()),
                    Expr::literal("release", span()),
                ],
                span(),
            ),
            Expr::concat(
                vec![Expr::literal("-O2", span()), Expr::literal(" -DNDEBUG", span())],
                span(),
            ),
            Expr::literal("-g", span()),
            span(),
        ),
    );

    // The remaining variables are consumed by the toolset, not by other
    // expressions, so they are defined as properties.
    let prog = project.add_target(top, "prog");
    let prog_scope = ScopeRef::target(top, prog);
    project.define_property(
        prog_scope,
        "sources",
        vartypes::list_of(vartypes::string()),
        Some(Expr::literal("main.c", span())),
    );
    project.define_property(
        prog_scope,
        "objdir",
        vartypes::path(),
        Some(Expr::path(
            Anchor::Builddir,
            vec![Expr::literal("obj", span())],
            span(),
        )),
    );
    project.define_property(
        prog_scope,
        "cflags",
        vartypes::string(),
        Some(Expr::reference("flags", prog_scope, span())),
    );

    project.define_property(
        sub_scope,
        "extra_src",
        vartypes::path(),
        Some(Expr::literal("foo.c", span())),
    );

    project
}

#[derive(Default)]
struct AnchorCollector {
    anchors: Vec<Anchor>,
}

impl Visitor for AnchorCollector {
    fn path(&mut self, _e: &Expr, p: &ExprPath) -> Result<()> {
        self.anchors.push(p.anchor.clone());
        self.visit_all(&p.components)
    }
}

fn collect_anchors(project: &Project) -> Vec<Anchor> {
    let mut collector = AnchorCollector::default();
    for id in project.all_variables() {
        collector.visit(&project.var(id).value).unwrap();
    }
    collector.anchors
}

fn snapshot(project: &Project) -> Vec<String> {
    project
        .all_variables()
        .map(|id| {
            let var = project.var(id);
            format!("{} = {}", var.name, var.value)
        })
        .collect()
}

#[test]
fn pipeline_normalizes_and_simplifies_the_model() {
    let mut project = sample_project();
    let mut ctx = PassContext::new(Some(Arc::new(MakeToolset)));
    Pipeline::standard().run(&mut project, &mut ctx).unwrap();

    // No @srcdir anchor survives; @builddir was translated.
    for anchor in collect_anchors(&project) {
        assert!(anchor != Anchor::Srcdir && anchor != Anchor::Builddir);
    }

    let vars = snapshot(&project);
    assert_eq!(
        vars,
        vec![
            "variant = release".to_string(),
            "flags = -O2 -DNDEBUG".to_string(),
            "sources = [main.c]".to_string(),
            "objdir = @top_srcdir/build/prog/obj".to_string(),
            "cflags = -O2 -DNDEBUG".to_string(),
            "extra_src = @top_srcdir/sub/dir/foo.c".to_string(),
        ]
    );
}

#[test]
fn pipeline_is_idempotent_on_a_normalized_model() {
    let mut project = sample_project();
    let mut ctx = PassContext::new(Some(Arc::new(MakeToolset)));
    let pipeline = Pipeline::standard();
    pipeline.run(&mut project, &mut ctx).unwrap();
    let first = snapshot(&project);

    let mut ctx = PassContext::new(Some(Arc::new(MakeToolset)));
    pipeline.run(&mut project, &mut ctx).unwrap();
    assert_eq!(snapshot(&project), first);
}

#[test]
fn unused_variables_warn_without_aborting() {
    let mut project = sample_project();
    let top_scope = ScopeRef::module(0);
    project.define(
        top_scope,
        "tpyo",
        vartypes::any(),
        Expr::literal("never read", span()),
    );

    let mut ctx = PassContext::new(Some(Arc::new(MakeToolset)));
    Pipeline::standard().run(&mut project, &mut ctx).unwrap();

    let warnings: Vec<_> = ctx.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("tpyo"));
}

#[test]
fn cyclic_definitions_abort_the_run() {
    let mut project = sample_project();
    let top_scope = ScopeRef::module(0);
    project.define(
        top_scope,
        "a",
        vartypes::any(),
        Expr::reference("b", top_scope, span()),
    );
    project.define(
        top_scope,
        "b",
        vartypes::any(),
        Expr::reference("a", top_scope, span()),
    );

    let mut ctx = PassContext::new(None);
    let err = Pipeline::standard()
        .run(&mut project, &mut ctx)
        .unwrap_err();
    assert!(matches!(err, Error::SelfReference { .. }));
    // The failing pass runs before unused-variable detection, so no
    // warnings were collected.
    assert!(ctx.diagnostics.is_empty());
}

#[test]
fn property_defaults_do_not_trigger_checks() {
    let mut project = sample_project();
    let top_scope = ScopeRef::module(0);
    // A property with no explicit binding: references to it resolve to
    // nothing and it is never flagged unused.
    project.define_property(top_scope, "outputdir", vartypes::path(), None);
    project.define(
        top_scope,
        "outdir_user",
        vartypes::any(),
        Expr::reference("outputdir", top_scope, span()),
    );

    let mut ctx = PassContext::new(Some(Arc::new(MakeToolset)));
    Pipeline::standard().run(&mut project, &mut ctx).unwrap();

    let warnings: Vec<_> = ctx.diagnostics.warnings().collect();
    // Only outdir_user itself is unreferenced.
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("outdir_user"));
}
