use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expr::{Anchor, Expr, ExprIf, ExprKind, Rewriter};
use crate::span::Span;

/// Type descriptor attached to every variable.
///
/// `normalize` coerces a value into the type's canonical shape and must
/// not fail; anything it cannot coerce is left in place for `validate`
/// to reject. Validation of one variable may inspect other variables'
/// values through references, so all normalization runs to completion
/// before any validation starts (the passes enforce this ordering).
pub trait VarType: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn normalize(&self, value: Expr) -> Expr {
        value
    }

    fn validate(&self, var: &str, value: &Expr) -> Result<()>;
}

fn mismatch(var: &str, ty: &dyn VarType, value: &Expr, detail: impl Into<String>) -> Error {
    Error::Type {
        name: var.to_string(),
        ty: ty.name().to_string(),
        detail: detail.into(),
        span: value.span,
    }
}

/// Nodes whose type cannot be decided before simplification: a
/// reference may expand to anything, a conditional to either branch and
/// null to the type's default.
fn validate_opaque(ty: &dyn VarType, var: &str, value: &Expr) -> Option<Result<()>> {
    match &value.kind {
        ExprKind::Null | ExprKind::Reference(_) => Some(Ok(())),
        ExprKind::If(i) => Some(
            ty.validate(var, &i.then_branch)
                .and_then(|_| ty.validate(var, &i.else_branch)),
        ),
        _ => None,
    }
}

/// Free-form type placing no constraints on the value.
#[derive(Debug, Clone, Copy)]
pub struct AnyType;

impl VarType for AnyType {
    fn name(&self) -> &'static str {
        "any"
    }

    fn validate(&self, _var: &str, _value: &Expr) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoolType;

impl VarType for BoolType {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn normalize(&self, value: Expr) -> Expr {
        match value.as_literal() {
            Some("true") => Expr::bool_value(true, value.span),
            Some("false") => Expr::bool_value(false, value.span),
            _ => value,
        }
    }

    fn validate(&self, var: &str, value: &Expr) -> Result<()> {
        if let Some(result) = validate_opaque(self, var, value) {
            return result;
        }
        match &value.kind {
            ExprKind::BoolValue(_) | ExprKind::Bool(_) => Ok(()),
            _ => Err(mismatch(
                var,
                self,
                value,
                format!("\"{}\" is not a boolean value", value),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StringType;

impl VarType for StringType {
    fn name(&self) -> &'static str {
        "string"
    }

    fn validate(&self, var: &str, value: &Expr) -> Result<()> {
        if let Some(result) = validate_opaque(self, var, value) {
            return result;
        }
        match &value.kind {
            ExprKind::Literal(_) => Ok(()),
            ExprKind::Concat(items) => {
                for item in items {
                    self.validate(var, item)?;
                }
                Ok(())
            }
            _ => Err(mismatch(
                var,
                self,
                value,
                format!("\"{}\" is not a string", value),
            )),
        }
    }
}

/// Homogeneous list; scalar values are coerced into single-item lists.
#[derive(Debug, Clone)]
pub struct ListType {
    item: Arc<dyn VarType>,
}

impl ListType {
    pub fn new(item: Arc<dyn VarType>) -> Self {
        Self { item }
    }
}

impl VarType for ListType {
    fn name(&self) -> &'static str {
        "list"
    }

    fn normalize(&self, value: Expr) -> Expr {
        let span = value.span;
        match value.kind {
            ExprKind::List(items) => Expr::list(
                items
                    .into_iter()
                    .map(|item| self.item.normalize(item))
                    .collect(),
                span,
            ),
            ExprKind::Null => Expr::null(span),
            ExprKind::If(i) => Expr::if_(
                *i.cond,
                self.normalize(*i.then_branch),
                self.normalize(*i.else_branch),
                span,
            ),
            kind => {
                let item = self.item.normalize(Expr::new(kind, span));
                Expr::list(vec![item], span)
            }
        }
    }

    fn validate(&self, var: &str, value: &Expr) -> Result<()> {
        if let Some(result) = validate_opaque(self, var, value) {
            return result;
        }
        match &value.kind {
            ExprKind::List(items) => {
                for item in items {
                    self.item.validate(var, item)?;
                }
                Ok(())
            }
            _ => Err(mismatch(
                var,
                self,
                value,
                format!("\"{}\" is not a list", value),
            )),
        }
    }
}

/// Path expression; literal values are split on `/` and anchored at the
/// module's source directory, to be re-anchored by path normalization.
#[derive(Debug, Clone, Copy)]
pub struct PathType;

impl VarType for PathType {
    fn name(&self) -> &'static str {
        "path"
    }

    fn normalize(&self, value: Expr) -> Expr {
        let span = value.span;
        match value.kind {
            ExprKind::Literal(text) => {
                let components = text
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(|s| Expr::literal(s, span))
                    .collect();
                Expr::path(Anchor::Srcdir, components, span)
            }
            ExprKind::If(i) => Expr::if_(
                *i.cond,
                self.normalize(*i.then_branch),
                self.normalize(*i.else_branch),
                span,
            ),
            kind => Expr::new(kind, span),
        }
    }

    fn validate(&self, var: &str, value: &Expr) -> Result<()> {
        if let Some(result) = validate_opaque(self, var, value) {
            return result;
        }
        match &value.kind {
            ExprKind::Path(p) => {
                for component in &p.components {
                    if matches!(component.kind, ExprKind::List(_) | ExprKind::Path(_)) {
                        return Err(mismatch(
                            var,
                            self,
                            component,
                            format!("\"{}\" is not a valid path component", component),
                        ));
                    }
                }
                Ok(())
            }
            _ => Err(mismatch(
                var,
                self,
                value,
                format!("\"{}\" is not a path", value),
            )),
        }
    }
}

pub fn any() -> Arc<dyn VarType> {
    Arc::new(AnyType)
}

pub fn boolean() -> Arc<dyn VarType> {
    Arc::new(BoolType)
}

pub fn string() -> Arc<dyn VarType> {
    Arc::new(StringType)
}

pub fn list_of(item: Arc<dyn VarType>) -> Arc<dyn VarType> {
    Arc::new(ListType::new(item))
}

pub fn path() -> Arc<dyn VarType> {
    Arc::new(PathType)
}

/// Rewrites every `if` condition into canonical boolean form and
/// validates it, before general type coercion runs. General coercion
/// must never reinterpret a condition as a plain value.
pub fn normalize_bool_subexpressions(var: &str, value: Expr) -> Result<Expr> {
    let mut normalizer = BoolSubexprNormalizer { var };
    normalizer.rewrite(value)
}

struct BoolSubexprNormalizer<'a> {
    var: &'a str,
}

impl Rewriter for BoolSubexprNormalizer<'_> {
    fn if_(&mut self, span: Span, i: ExprIf) -> Result<Expr> {
        let cond = BoolType.normalize(self.rewrite(*i.cond)?);
        BoolType.validate(self.var, &cond)?;
        let then_branch = self.rewrite(*i.then_branch)?;
        let else_branch = self.rewrite(*i.else_branch)?;
        Ok(Expr::if_(cond, then_branch, else_branch, span))
    }
}
