use crate::model::ScopeRef;
use crate::span::Span;
use crate::{common_enum, common_struct};
use std::fmt::{Display, Formatter};

mod visitor;

pub use visitor::*;

common_enum! {
    /// Conceptual root a path expression is relative to.
    pub enum Anchor {
        /// Source directory of the module the expression appears in.
        Srcdir,
        /// Source directory of the project's top-level module.
        TopSrcdir,
        /// Build directory of the current target; only resolvable with a
        /// toolset and a target context.
        Builddir,
        /// Toolset-defined anchor, opaque to the passes.
        Custom(String),
    }
}

impl Display for Anchor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Anchor::Srcdir => write!(f, "@srcdir"),
            Anchor::TopSrcdir => write!(f, "@top_srcdir"),
            Anchor::Builddir => write!(f, "@builddir"),
            Anchor::Custom(name) => write!(f, "@{}", name),
        }
    }
}

common_enum! {
    pub enum BoolOp {
        And,
        Or,
        Equal,
        NotEqual,
        Not,
    }
}

common_struct! {
    /// Reference to a variable, resolved lazily through the lexical
    /// context it was written in. A reference's target is not part of
    /// this tree.
    pub struct ExprReference {
        pub var: String,
        pub context: ScopeRef,
    }
}

common_struct! {
    pub struct ExprPath {
        pub anchor: Anchor,
        pub components: Vec<Expr>,
    }
}

common_struct! {
    pub struct ExprBool {
        pub op: BoolOp,
        /// One operand for `Not`, two for the binary operators.
        pub operands: Vec<Expr>,
    }
}

common_struct! {
    pub struct ExprIf {
        pub cond: Box<Expr>,
        pub then_branch: Box<Expr>,
        pub else_branch: Box<Expr>,
    }
}

common_enum! {
    /// Closed set of expression node kinds. Variables hold these as
    /// trees; passes replace a variable's root by whole-subtree
    /// substitution.
    pub enum ExprKind {
        Literal(String),
        BoolValue(bool),
        Null,
        Reference(ExprReference),
        Concat(Vec<Expr>),
        List(Vec<Expr>),
        Path(ExprPath),
        Bool(ExprBool),
        If(ExprIf),
    }
}

common_struct! {
    pub struct Expr {
        pub span: Span,
        pub kind: ExprKind,
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { span, kind }
    }

    pub fn literal(text: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Literal(text.into()), span)
    }

    pub fn bool_value(value: bool, span: Span) -> Self {
        Self::new(ExprKind::BoolValue(value), span)
    }

    pub fn null(span: Span) -> Self {
        Self::new(ExprKind::Null, span)
    }

    pub fn reference(var: impl Into<String>, context: ScopeRef, span: Span) -> Self {
        Self::new(
            ExprKind::Reference(ExprReference {
                var: var.into(),
                context,
            }),
            span,
        )
    }

    pub fn concat(items: Vec<Expr>, span: Span) -> Self {
        Self::new(ExprKind::Concat(items), span)
    }

    pub fn list(items: Vec<Expr>, span: Span) -> Self {
        Self::new(ExprKind::List(items), span)
    }

    pub fn path(anchor: Anchor, components: Vec<Expr>, span: Span) -> Self {
        Self::new(ExprKind::Path(ExprPath { anchor, components }), span)
    }

    pub fn bool_op(op: BoolOp, operands: Vec<Expr>, span: Span) -> Self {
        Self::new(ExprKind::Bool(ExprBool { op, operands }), span)
    }

    pub fn if_(cond: Expr, then_branch: Expr, else_branch: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::If(ExprIf {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            }),
            span,
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ExprKind::Null)
    }

    pub fn as_literal(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Literal(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool_value(&self) -> Option<bool> {
        match &self.kind {
            ExprKind::BoolValue(value) => Some(*value),
            _ => None,
        }
    }

    /// JSON snapshot of the tree, for debug dumps and test assertions.
    pub fn to_json(&self) -> crate::error::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn write_joined(f: &mut Formatter<'_>, items: &[Expr], sep: &str) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Literal(text) => write!(f, "{}", text),
            ExprKind::BoolValue(value) => write!(f, "{}", value),
            ExprKind::Null => write!(f, "null"),
            ExprKind::Reference(r) => write!(f, "$({})", r.var),
            ExprKind::Concat(items) => write_joined(f, items, ""),
            ExprKind::List(items) => {
                write!(f, "[")?;
                write_joined(f, items, ", ")?;
                write!(f, "]")
            }
            ExprKind::Path(p) => {
                write!(f, "{}", p.anchor)?;
                for component in &p.components {
                    write!(f, "/{}", component)?;
                }
                Ok(())
            }
            ExprKind::Bool(b) => match b.op {
                BoolOp::Not => match b.operands.first() {
                    Some(operand) => write!(f, "!{}", operand),
                    None => write!(f, "!"),
                },
                BoolOp::And => {
                    write!(f, "(")?;
                    write_joined(f, &b.operands, " && ")?;
                    write!(f, ")")
                }
                BoolOp::Or => {
                    write!(f, "(")?;
                    write_joined(f, &b.operands, " || ")?;
                    write!(f, ")")
                }
                BoolOp::Equal => {
                    write!(f, "(")?;
                    write_joined(f, &b.operands, " == ")?;
                    write!(f, ")")
                }
                BoolOp::NotEqual => {
                    write!(f, "(")?;
                    write_joined(f, &b.operands, " != ")?;
                    write!(f, ")")
                }
            },
            ExprKind::If(i) => write!(
                f,
                "({} ? {} : {})",
                i.cond, i.then_branch, i.else_branch
            ),
        }
    }
}
