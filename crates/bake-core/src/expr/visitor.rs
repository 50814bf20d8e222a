use super::{Expr, ExprBool, ExprIf, ExprKind, ExprPath, ExprReference};
use crate::error::Result;
use crate::span::Span;

/// Read-only traversal over an expression tree.
///
/// Leaf kinds (`literal`, `bool_value`, `null`) default to no-op, as
/// does `reference` -- a reference's target is not part of the tree and
/// must be followed explicitly by overriding [`Visitor::reference`].
/// Composite kinds default to visiting all children.
pub trait Visitor {
    fn visit(&mut self, e: &Expr) -> Result<()> {
        match &e.kind {
            ExprKind::Literal(text) => self.literal(e, text),
            ExprKind::BoolValue(value) => self.bool_value(e, *value),
            ExprKind::Null => self.null(e),
            ExprKind::Reference(r) => self.reference(e, r),
            ExprKind::Concat(items) => self.concat(e, items),
            ExprKind::List(items) => self.list(e, items),
            ExprKind::Path(p) => self.path(e, p),
            ExprKind::Bool(b) => self.bool_op(e, b),
            ExprKind::If(i) => self.if_(e, i),
        }
    }

    fn visit_all(&mut self, items: &[Expr]) -> Result<()> {
        for item in items {
            self.visit(item)?;
        }
        Ok(())
    }

    fn literal(&mut self, _e: &Expr, _text: &str) -> Result<()> {
        Ok(())
    }

    fn bool_value(&mut self, _e: &Expr, _value: bool) -> Result<()> {
        Ok(())
    }

    fn null(&mut self, _e: &Expr) -> Result<()> {
        Ok(())
    }

    fn reference(&mut self, _e: &Expr, _r: &ExprReference) -> Result<()> {
        Ok(())
    }

    fn concat(&mut self, _e: &Expr, items: &[Expr]) -> Result<()> {
        self.visit_all(items)
    }

    fn list(&mut self, _e: &Expr, items: &[Expr]) -> Result<()> {
        self.visit_all(items)
    }

    fn path(&mut self, _e: &Expr, p: &ExprPath) -> Result<()> {
        self.visit_all(&p.components)
    }

    fn bool_op(&mut self, _e: &Expr, b: &ExprBool) -> Result<()> {
        self.visit_all(&b.operands)
    }

    fn if_(&mut self, _e: &Expr, i: &ExprIf) -> Result<()> {
        self.visit(&i.cond)?;
        self.visit(&i.then_branch)?;
        self.visit(&i.else_branch)
    }
}

/// Consuming bottom-up traversal that rebuilds the tree.
///
/// Composite kinds default to a new node of the same kind whose children
/// are the rewritten originals; leaves and references default to
/// identity. Handlers return the replacement node, enabling bottom-up
/// whole-subtree substitution.
pub trait Rewriter {
    fn rewrite(&mut self, e: Expr) -> Result<Expr> {
        let Expr { span, kind } = e;
        match kind {
            ExprKind::Literal(text) => self.literal(span, text),
            ExprKind::BoolValue(value) => self.bool_value(span, value),
            ExprKind::Null => self.null(span),
            ExprKind::Reference(r) => self.reference(span, r),
            ExprKind::Concat(items) => self.concat(span, items),
            ExprKind::List(items) => self.list(span, items),
            ExprKind::Path(p) => self.path(span, p),
            ExprKind::Bool(b) => self.bool_op(span, b),
            ExprKind::If(i) => self.if_(span, i),
        }
    }

    fn rewrite_all(&mut self, items: Vec<Expr>) -> Result<Vec<Expr>> {
        items.into_iter().map(|item| self.rewrite(item)).collect()
    }

    fn literal(&mut self, span: Span, text: String) -> Result<Expr> {
        Ok(Expr::new(ExprKind::Literal(text), span))
    }

    fn bool_value(&mut self, span: Span, value: bool) -> Result<Expr> {
        Ok(Expr::new(ExprKind::BoolValue(value), span))
    }

    fn null(&mut self, span: Span) -> Result<Expr> {
        Ok(Expr::new(ExprKind::Null, span))
    }

    fn reference(&mut self, span: Span, r: ExprReference) -> Result<Expr> {
        Ok(Expr::new(ExprKind::Reference(r), span))
    }

    fn concat(&mut self, span: Span, items: Vec<Expr>) -> Result<Expr> {
        Ok(Expr::new(ExprKind::Concat(self.rewrite_all(items)?), span))
    }

    fn list(&mut self, span: Span, items: Vec<Expr>) -> Result<Expr> {
        Ok(Expr::new(ExprKind::List(self.rewrite_all(items)?), span))
    }

    fn path(&mut self, span: Span, p: ExprPath) -> Result<Expr> {
        Ok(Expr::new(
            ExprKind::Path(ExprPath {
                anchor: p.anchor,
                components: self.rewrite_all(p.components)?,
            }),
            span,
        ))
    }

    fn bool_op(&mut self, span: Span, b: ExprBool) -> Result<Expr> {
        Ok(Expr::new(
            ExprKind::Bool(ExprBool {
                op: b.op,
                operands: self.rewrite_all(b.operands)?,
            }),
            span,
        ))
    }

    fn if_(&mut self, span: Span, i: ExprIf) -> Result<Expr> {
        let cond = self.rewrite(*i.cond)?;
        let then_branch = self.rewrite(*i.then_branch)?;
        let else_branch = self.rewrite(*i.else_branch)?;
        Ok(Expr::if_(cond, then_branch, else_branch, span))
    }
}
