//! Error types for expression compilation
//!
//! Two classes: user-facing query errors that carry the offending source
//! span, and internal-consistency failures that indicate a malformed AST
//! or a compiler bug.

use thiserror::Error;

use crate::ast::Span;
use crate::parse::ParseError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Malformed or ill-typed query input
    #[error("{message}{}", fmt_span(.span))]
    Query { message: String, span: Option<Span> },

    /// The compiler was handed something it cannot explain
    #[error("internal compiler error: {0}")]
    Internal(String),
}

fn fmt_span(span: &Option<Span>) -> String {
    match span {
        Some(span) => format!(" (at {span})"),
        None => String::new(),
    }
}

impl CompileError {
    pub fn query(message: impl Into<String>, span: Option<Span>) -> Self {
        CompileError::Query {
            message: message.into(),
            span,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal(message.into())
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Query { span, .. } => *span,
            CompileError::Internal(_) => None,
        }
    }

    /// The bare message without location information
    pub fn message(&self) -> &str {
        match self {
            CompileError::Query { message, .. } => message,
            CompileError::Internal(message) => message,
        }
    }
}

/// Errors raised while building a schema catalog
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("type '{0}' does not exist")]
    UnknownType(String),

    #[error("type '{0}' is already defined")]
    Duplicate(String),

    #[error("'{0}' is not an object type")]
    NotAnObjectType(String),

    #[error("invalid type expression: {0}")]
    InvalidTypeExpr(String),
}

pub(crate) type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_display_includes_span() {
        let err = CompileError::query("nested arrays are not supported", Some(Span::new(3, 9)));
        assert_eq!(err.to_string(), "nested arrays are not supported (at 3..9)");
        assert!(!err.is_internal());
    }

    #[test]
    fn internal_error_has_no_span() {
        let err = CompileError::internal("unexpected node");
        assert!(err.is_internal());
        assert_eq!(err.span(), None);
        assert_eq!(err.message(), "unexpected node");
    }
}
