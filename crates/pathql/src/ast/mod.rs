//! AST types for PathQL expressions
//!
//! The parser front end produces these; the compiler reads them and never
//! mutates them. Split into:
//! - `expr`: the expression node union and path steps
//! - this module: shared leaves (spans, constants, operators, type expressions)

mod expr;

pub use expr::{Expr, ExprKind, IndirectionEl, IsOp, Path, PathStep, TupleElement};

use serde::Serialize;
use std::fmt;

/// Byte range of a node in the query source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Literal constants as written in the source
///
/// Numeric literals keep their source text; the sign of a negated literal is
/// carried separately so the compiler can range-check the signed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    String(String),
    RawString(String),
    Integer { value: String, is_negative: bool },
    Float { value: String, is_negative: bool },
    Boolean(bool),
    /// Body of a `b'...'` literal, escapes still undecoded
    Bytes(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Concat,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    ILike,

    // Logical
    And,
    Or,

    // Set
    In,
    NotIn,
    Union,
    Coalesce,
}

impl BinOp {
    /// Operator name as registered in the catalog (without module)
    pub fn name(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::Concat => "++",
            BinOp::Eq => "=",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Like => "LIKE",
            BinOp::ILike => "ILIKE",
            BinOp::And => "AND",
            BinOp::Or => "OR",
            BinOp::In => "IN",
            BinOp::NotIn => "NOT IN",
            BinOp::Union => "UNION",
            BinOp::Coalesce => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    Exists,
    Distinct,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "NOT",
            UnaryOp::Exists => "EXISTS",
            UnaryOp::Distinct => "DISTINCT",
        }
    }
}

/// A type reference as written: `str`, `std::int64`, `array<str>`,
/// `tuple<a: int64, b: str>`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub module: Option<String>,
    pub name: String,
    pub subtypes: Vec<TypeExpr>,
    /// Element name when this appears inside a named tuple type
    pub element_name: Option<String>,
    pub span: Span,
}

impl TypeExpr {
    /// Build from a possibly module-qualified name like `std::str`
    pub fn named(qualified: &str) -> Self {
        let (module, name) = match qualified.rsplit_once("::") {
            Some((module, name)) => (Some(module.to_string()), name.to_string()),
            None => (None, qualified.to_string()),
        };
        Self {
            module,
            name,
            subtypes: Vec::new(),
            element_name: None,
            span: Span::default(),
        }
    }

    pub fn array(element: TypeExpr) -> Self {
        let mut texpr = Self::named("array");
        texpr.subtypes.push(element);
        texpr
    }

    pub fn tuple(elements: Vec<TypeExpr>) -> Self {
        let mut texpr = Self::named("tuple");
        texpr.subtypes = elements;
        texpr
    }

    pub fn with_element_name(mut self, name: impl Into<String>) -> Self {
        self.element_name = Some(name.into());
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// `module::name` or bare `name`
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}::{}", self.name),
            None => self.name.clone(),
        }
    }
}
