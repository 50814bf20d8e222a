use bake_core::error::Result;
use bake_core::expr::{BoolOp, Expr, ExprBool, ExprIf, ExprKind, ExprReference, Rewriter};
use bake_core::model::{Project, VarId};
use bake_core::span::Span;
use itertools::Itertools;
use tracing::debug;

/// Statically-known scalar used when folding boolean operators.
#[derive(Debug, Clone, PartialEq)]
enum ConstValue {
    Bool(bool),
    Text(String),
}

/// Cheap, single-pass simplifications: merging adjacent literals in a
/// concatenation, eliminating references that merely alias another
/// variable's fully-known value, folding boolean operators over
/// constant operands and dropping conditionals whose condition is a
/// constant.
pub struct BasicSimplifier<'a> {
    project: &'a Project,
    modified: bool,
    /// When set, condition evaluation chases references and equal
    /// branches collapse; this is the expensive mode reserved for
    /// [`ConditionalsSimplifier`].
    resolve_conditions: bool,
}

impl<'a> BasicSimplifier<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            modified: false,
            resolve_conditions: false,
        }
    }

    fn with_condition_resolution(project: &'a Project) -> Self {
        Self {
            project,
            modified: false,
            resolve_conditions: true,
        }
    }

    /// Whether any rewrite actually changed the tree.
    pub fn modified(&self) -> bool {
        self.modified
    }

    fn mark(&mut self) {
        self.modified = true;
    }

    fn eval_condition(&self, e: &Expr) -> Option<bool> {
        match &e.kind {
            ExprKind::BoolValue(value) => Some(*value),
            ExprKind::Bool(b) => self.eval_bool_op(b),
            ExprKind::Reference(r) if self.resolve_conditions => {
                let id = self.project.resolve_ref(r)?;
                self.eval_condition(&self.project.var(id).value)
            }
            _ => None,
        }
    }

    fn eval_bool_op(&self, b: &ExprBool) -> Option<bool> {
        match b.op {
            BoolOp::Not => self.eval_condition(b.operands.first()?).map(|v| !v),
            BoolOp::And => {
                let lhs = self.eval_condition(b.operands.first()?);
                let rhs = self.eval_condition(b.operands.get(1)?);
                match (lhs, rhs) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }
            }
            BoolOp::Or => {
                let lhs = self.eval_condition(b.operands.first()?);
                let rhs = self.eval_condition(b.operands.get(1)?);
                match (lhs, rhs) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                }
            }
            BoolOp::Equal | BoolOp::NotEqual => {
                let lhs = self.const_value(b.operands.first()?)?;
                let rhs = self.const_value(b.operands.get(1)?)?;
                let equal = lhs == rhs;
                Some(if b.op == BoolOp::Equal { equal } else { !equal })
            }
        }
    }

    fn const_value(&self, e: &Expr) -> Option<ConstValue> {
        match &e.kind {
            ExprKind::Literal(text) => Some(ConstValue::Text(text.clone())),
            ExprKind::BoolValue(value) => Some(ConstValue::Bool(*value)),
            ExprKind::Concat(items) => {
                let mut text = String::new();
                for item in items {
                    match self.const_value(item)? {
                        ConstValue::Text(t) => text.push_str(&t),
                        ConstValue::Bool(_) => return None,
                    }
                }
                Some(ConstValue::Text(text))
            }
            ExprKind::Reference(r) if self.resolve_conditions => {
                let id = self.project.resolve_ref(r)?;
                self.const_value(&self.project.var(id).value)
            }
            _ => None,
        }
    }
}

impl Rewriter for BasicSimplifier<'_> {
    fn reference(&mut self, span: Span, r: ExprReference) -> Result<Expr> {
        // Replace a reference that merely aliases another variable's
        // fully-known value (turn foo=$(x); bar=$(foo) into bar=$(x)).
        // The reference graph is acyclic by the time this runs.
        if let Some(id) = self.project.resolve_ref(&r) {
            let target = &self.project.var(id).value;
            if matches!(
                target.kind,
                ExprKind::Reference(_)
                    | ExprKind::Literal(_)
                    | ExprKind::BoolValue(_)
                    | ExprKind::Null
            ) {
                self.mark();
                let replacement = target.clone();
                return self.rewrite(replacement);
            }
        }
        Ok(Expr::new(ExprKind::Reference(r), span))
    }

    fn concat(&mut self, span: Span, items: Vec<Expr>) -> Result<Expr> {
        let items = self.rewrite_all(items)?;
        let before = items.len();
        let mut merged: Vec<Expr> = items
            .into_iter()
            .coalesce(|a, b| {
                if let (ExprKind::Literal(ta), ExprKind::Literal(tb)) = (&a.kind, &b.kind) {
                    let text = format!("{}{}", ta, tb);
                    Ok(Expr::literal(text, a.span))
                } else {
                    Err((a, b))
                }
            })
            .collect();
        if merged.len() != before {
            self.mark();
        }
        if merged.len() == 1 {
            // Unwrapping is a rewrite too; it can turn an opaque
            // reference target into a constant for the next sweep.
            self.mark();
            return Ok(merged.remove(0));
        }
        Ok(Expr::concat(merged, span))
    }

    fn bool_op(&mut self, span: Span, b: ExprBool) -> Result<Expr> {
        let b = ExprBool {
            op: b.op,
            operands: self.rewrite_all(b.operands)?,
        };
        if let Some(value) = self.eval_bool_op(&b) {
            self.mark();
            return Ok(Expr::bool_value(value, span));
        }
        Ok(Expr::new(ExprKind::Bool(b), span))
    }

    fn if_(&mut self, span: Span, i: ExprIf) -> Result<Expr> {
        let cond = self.rewrite(*i.cond)?;
        let then_branch = self.rewrite(*i.then_branch)?;
        let else_branch = self.rewrite(*i.else_branch)?;

        if let Some(value) = self.eval_condition(&cond) {
            self.mark();
            return Ok(if value { then_branch } else { else_branch });
        }
        if self.resolve_conditions && then_branch == else_branch {
            self.mark();
            return Ok(then_branch);
        }
        Ok(Expr::if_(cond, then_branch, else_branch, span))
    }
}

/// Variant of [`BasicSimplifier`] specialized at removing `if` nodes:
/// it is willing to chase references when deciding a condition and
/// collapses conditionals whose branches are equal.
pub struct ConditionalsSimplifier<'a> {
    inner: BasicSimplifier<'a>,
}

impl<'a> ConditionalsSimplifier<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            inner: BasicSimplifier::with_condition_resolution(project),
        }
    }

    pub fn modified(&self) -> bool {
        self.inner.modified()
    }
}

impl Rewriter for ConditionalsSimplifier<'_> {
    fn rewrite(&mut self, e: Expr) -> Result<Expr> {
        self.inner.rewrite(e)
    }
}

/// Simplifies expressions in the model. This does "cheap"
/// simplifications only; the expensive conditional analysis lives in
/// [`eliminate_superfluous_conditionals`].
pub fn simplify_exprs(project: &mut Project) -> Result<()> {
    debug!("simplifying expressions");
    let ids: Vec<VarId> = project.all_variables().collect();
    for id in ids {
        let value = project.take_value(id);
        let rewritten = {
            let mut simplifier = BasicSimplifier::new(project);
            simplifier.rewrite(value)?
        };
        project.set_value(id, rewritten);
    }
    Ok(())
}

/// Removes as much conditional content as possible, iterating to a
/// fixed point: resolving one conditional can expose a previously
/// opaque reference as constant, enabling further elimination. The loop
/// is bounded only by the "no change this sweep" signal.
pub fn eliminate_superfluous_conditionals(project: &mut Project) -> Result<()> {
    let ids: Vec<VarId> = project.all_variables().collect();
    let mut iteration = 1u32;
    loop {
        debug!(iteration, "removing superfluous conditional expressions");
        let mut modified = false;
        for &id in &ids {
            let value = project.take_value(id);
            let (rewritten, changed) = {
                let mut simplifier = ConditionalsSimplifier::new(project);
                let rewritten = simplifier.rewrite(value)?;
                (rewritten, simplifier.modified())
            };
            project.set_value(id, rewritten);
            modified |= changed;
        }
        if !modified {
            break;
        }
        iteration += 1;
    }
    Ok(())
}
