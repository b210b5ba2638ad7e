//! Expression nodes
//!
//! One variant per surface form. The compiler's dispatch matches on
//! [`ExprKind`] exhaustively, so a new variant without a handler does not build.

use super::{BinOp, Constant, Span, TypeExpr, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Binary operation: `a + b`, `a UNION b`
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },

    /// Prefix operation: `-x`, `NOT x`, `EXISTS x`
    UnaryOp { op: UnaryOp, operand: Box<Expr> },

    /// Path navigation: `User.friends.name`
    Path(Path),

    /// Literal value
    Constant(Constant),

    /// Positional tuple: `(1, 'a')`
    Tuple(Vec<Expr>),

    /// Named tuple: `(a := 1, b := 'a')`
    NamedTuple(Vec<TupleElement>),

    /// Array literal: `[1, 2, 3]`
    Array(Vec<Expr>),

    /// Set literal: `{1, 2, 3}`
    Set(Vec<Expr>),

    /// Type cast: `<str>expr`
    TypeCast { expr: Box<Expr>, target: TypeExpr },

    /// Type filter: `expr[IS Type]`
    TypeFilter { expr: Box<Expr>, target: TypeExpr },

    /// Type check: `expr IS Type`, `expr IS NOT Type`
    IsOp {
        left: Box<Expr>,
        op: IsOp,
        right: TypeExpr,
    },

    /// `a IF cond ELSE b`
    IfElse {
        condition: Box<Expr>,
        if_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },

    /// Subscripts and slices: `expr[0]`, `expr[1:]`, `expr[i][j:k]`
    Indirection {
        arg: Box<Expr>,
        indirection: Vec<IndirectionEl>,
    },

    /// Query parameter reference: `$name`, `$0`
    Parameter { name: String },

    /// `INTROSPECT Type`
    Introspect(TypeExpr),

    /// `DETACHED expr`
    Detached(Box<Expr>),

    /// Marks the wrapped path as optional in the enclosing scope
    Optional(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    pub name: String,
    pub val: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsOp {
    Is,
    IsNot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndirectionEl {
    Index(Expr),
    Slice {
        start: Option<Expr>,
        stop: Option<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub steps: Vec<PathStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// Path anchor: `User`, `default::User`
    ObjectRef { module: Option<String>, name: String },
    /// Outbound pointer: `.name`
    Ptr { name: String },
    /// Type intersection inside a path: `[IS Admin]`
    TypeIntersection(TypeExpr),
}

// ============ Builders ============

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn int(value: i64) -> Self {
        Self::integer_literal(&value.unsigned_abs().to_string(), value < 0)
    }

    /// Integer literal from source digits; use for values outside `i64`
    pub fn integer_literal(digits: &str, is_negative: bool) -> Self {
        Self::new(ExprKind::Constant(Constant::Integer {
            value: digits.to_string(),
            is_negative,
        }))
    }

    pub fn float(value: f64) -> Self {
        Self::new(ExprKind::Constant(Constant::Float {
            value: value.abs().to_string(),
            is_negative: value.is_sign_negative(),
        }))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Constant(Constant::String(value.into())))
    }

    pub fn raw_str(value: impl Into<String>) -> Self {
        Self::new(ExprKind::Constant(Constant::RawString(value.into())))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Constant(Constant::Boolean(value)))
    }

    pub fn bytes(body: impl Into<String>) -> Self {
        Self::new(ExprKind::Constant(Constant::Bytes(body.into())))
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Parameter { name: name.into() })
    }

    /// `Type.ptr.ptr`; the first segment may be module-qualified
    pub fn path(segments: &[&str]) -> Self {
        let mut steps = Vec::with_capacity(segments.len());
        if let Some((first, rest)) = segments.split_first() {
            let (module, name) = match first.rsplit_once("::") {
                Some((module, name)) => (Some(module.to_string()), name.to_string()),
                None => (None, first.to_string()),
            };
            steps.push(PathStep::ObjectRef { module, name });
            steps.extend(rest.iter().map(|name| PathStep::Ptr {
                name: name.to_string(),
            }));
        }
        Self::new(ExprKind::Path(Path { steps }))
    }

    pub fn binop(self, op: BinOp, rhs: Expr) -> Self {
        Self::new(ExprKind::BinOp {
            left: Box::new(self),
            op,
            right: Box::new(rhs),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn cast(target: TypeExpr, expr: Expr) -> Self {
        Self::new(ExprKind::TypeCast {
            expr: Box::new(expr),
            target,
        })
    }

    pub fn set(elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::Set(elements))
    }

    pub fn array(elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::Array(elements))
    }

    pub fn tuple(elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::Tuple(elements))
    }

    pub fn named_tuple(elements: Vec<(&str, Expr)>) -> Self {
        Self::new(ExprKind::NamedTuple(
            elements
                .into_iter()
                .map(|(name, val)| TupleElement {
                    name: name.to_string(),
                    val,
                })
                .collect(),
        ))
    }

    pub fn if_else(condition: Expr, if_expr: Expr, else_expr: Expr) -> Self {
        Self::new(ExprKind::IfElse {
            condition: Box::new(condition),
            if_expr: Box::new(if_expr),
            else_expr: Box::new(else_expr),
        })
    }

    pub fn is_type(self, op: IsOp, right: TypeExpr) -> Self {
        Self::new(ExprKind::IsOp {
            left: Box::new(self),
            op,
            right,
        })
    }

    pub fn type_filter(self, target: TypeExpr) -> Self {
        Self::new(ExprKind::TypeFilter {
            expr: Box::new(self),
            target,
        })
    }

    pub fn index(self, index: Expr) -> Self {
        self.push_indirection(IndirectionEl::Index(index))
    }

    pub fn slice(self, start: Option<Expr>, stop: Option<Expr>) -> Self {
        self.push_indirection(IndirectionEl::Slice { start, stop })
    }

    pub fn introspect(target: TypeExpr) -> Self {
        Self::new(ExprKind::Introspect(target))
    }

    pub fn detached(expr: Expr) -> Self {
        Self::new(ExprKind::Detached(Box::new(expr)))
    }

    pub fn optional(expr: Expr) -> Self {
        Self::new(ExprKind::Optional(Box::new(expr)))
    }

    /// Chained subscripts accumulate on a single indirection node
    fn push_indirection(self, el: IndirectionEl) -> Self {
        match self.kind {
            ExprKind::Indirection {
                arg,
                mut indirection,
            } => {
                indirection.push(el);
                Self {
                    kind: ExprKind::Indirection { arg, indirection },
                    span: self.span,
                }
            }
            kind => Self::new(ExprKind::Indirection {
                arg: Box::new(Self {
                    kind,
                    span: self.span,
                }),
                indirection: vec![el],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_int_keeps_sign_separate() {
        let expr = Expr::int(-42);
        assert_eq!(
            expr.kind,
            ExprKind::Constant(Constant::Integer {
                value: "42".into(),
                is_negative: true
            })
        );
    }

    #[test]
    fn int_min_digits() {
        let expr = Expr::int(i64::MIN);
        let ExprKind::Constant(Constant::Integer { value, .. }) = expr.kind else {
            panic!("expected integer constant");
        };
        assert_eq!(value, "9223372036854775808");
    }

    #[test]
    fn chained_subscripts_share_one_node() {
        let expr = Expr::array(vec![Expr::int(1)])
            .index(Expr::int(0))
            .slice(None, Some(Expr::int(1)));
        let ExprKind::Indirection { indirection, .. } = expr.kind else {
            panic!("expected indirection");
        };
        assert_eq!(indirection.len(), 2);
    }

    #[test]
    fn path_builder_splits_module() {
        let expr = Expr::path(&["default::User", "name"]);
        let ExprKind::Path(path) = expr.kind else {
            panic!("expected path");
        };
        assert_eq!(
            path.steps[0],
            PathStep::ObjectRef {
                module: Some("default".into()),
                name: "User".into()
            }
        );
        assert_eq!(path.steps.len(), 2);
    }
}
