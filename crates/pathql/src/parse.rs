//! Parser for type expressions
//!
//! Accepts the type syntax used in casts, `IS` checks and schema pointer
//! declarations: `str`, `std::int64`, `array<str>`, `tuple<a: int64, b: str>`.
//! Expression syntax is parsed by the front end, not here.

use winnow::ascii::multispace0;
use winnow::combinator::{delimited, not, opt, preceded, separated, terminated};
use winnow::prelude::*;
use winnow::stream::{LocatingSlice, Stream};
use winnow::token::{one_of, take_while};

use crate::ast::{Span, TypeExpr};

type Input<'i> = LocatingSlice<&'i str>;
type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (line {}, column {}, offset {})",
            self.message, self.line, self.column, self.offset
        )
    }
}

impl std::error::Error for ParseError {}

/// Parse a type expression from a string
pub fn parse_type(input: &str) -> Result<TypeExpr, ParseError> {
    let mut stream = LocatingSlice::new(input);
    match delimited(ws, type_expr, ws).parse_next(&mut stream) {
        Ok(parsed) => {
            if stream.eof_offset() == 0 {
                Ok(parsed)
            } else {
                let offset = input.len() - stream.eof_offset();
                Err(build_parse_error(
                    "unexpected trailing input".to_string(),
                    input,
                    offset,
                ))
            }
        }
        Err(e) => {
            let offset = input.len() - stream.eof_offset();
            Err(build_parse_error(format!("{:?}", e), input, offset))
        }
    }
}

fn build_parse_error(message: String, input: &str, offset: usize) -> ParseError {
    let (line, column) = offset_to_line_column(input, offset);
    ParseError {
        message,
        offset,
        line,
        column,
    }
}

fn offset_to_line_column(input: &str, offset: usize) -> (usize, usize) {
    let bounded = offset.min(input.len());
    let mut line = 1usize;
    let mut column = 1usize;

    for ch in input[..bounded].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

// ============ Grammar ============

fn type_expr(input: &mut Input<'_>) -> PResult<TypeExpr> {
    (qualified_name, opt(subtype_list))
        .with_span()
        .map(|(((module, name), subtypes), span)| TypeExpr {
            module,
            name,
            subtypes: subtypes.unwrap_or_default(),
            element_name: None,
            span: Span::new(span.start, span.end),
        })
        .parse_next(input)
}

fn subtype_list(input: &mut Input<'_>) -> PResult<Vec<TypeExpr>> {
    delimited(
        (ws, '<', ws),
        separated(0.., type_element, (ws, ',', ws)),
        (ws, '>'),
    )
    .parse_next(input)
}

/// A subtype, optionally labelled: `int64` or `a: int64`
fn type_element(input: &mut Input<'_>) -> PResult<TypeExpr> {
    let label = opt(terminated(ident, (ws, ':', not(':'), ws))).parse_next(input)?;
    let mut texpr = type_expr.parse_next(input)?;
    texpr.element_name = label.map(str::to_string);
    Ok(texpr)
}

fn qualified_name(input: &mut Input<'_>) -> PResult<(Option<String>, String)> {
    let first = ident.parse_next(input)?;
    let rest = opt(preceded("::", ident)).parse_next(input)?;
    Ok(match rest {
        Some(name) => (Some(first.to_string()), name.to_string()),
        None => (None, first.to_string()),
    })
}

fn ident<'i>(input: &mut Input<'i>) -> PResult<&'i str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn ws(input: &mut Input<'_>) -> PResult<()> {
    multispace0.void().parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_name() {
        let texpr = parse_type("str").unwrap();
        assert_eq!(texpr.module, None);
        assert_eq!(texpr.name, "str");
        assert!(texpr.subtypes.is_empty());
    }

    #[test]
    fn parse_qualified_name() {
        let texpr = parse_type("std::int64").unwrap();
        assert_eq!(texpr.module.as_deref(), Some("std"));
        assert_eq!(texpr.name, "int64");
        assert_eq!(texpr.span, Span::new(0, 10));
    }

    #[test]
    fn parse_array_of_qualified() {
        let texpr = parse_type("array<std::str>").unwrap();
        assert_eq!(texpr.name, "array");
        assert_eq!(texpr.subtypes.len(), 1);
        assert_eq!(texpr.subtypes[0].qualified_name(), "std::str");
    }

    #[test]
    fn parse_named_tuple() {
        let texpr = parse_type("tuple<a: int64, b: std::str>").unwrap();
        assert_eq!(texpr.subtypes.len(), 2);
        assert_eq!(texpr.subtypes[0].element_name.as_deref(), Some("a"));
        assert_eq!(texpr.subtypes[1].element_name.as_deref(), Some("b"));
        assert_eq!(texpr.subtypes[1].qualified_name(), "std::str");
    }

    #[test]
    fn parse_nested_collections() {
        let texpr = parse_type("  array<tuple<int64, str>>  ").unwrap();
        assert_eq!(texpr.subtypes[0].name, "tuple");
        assert_eq!(texpr.subtypes[0].subtypes.len(), 2);
        assert_eq!(texpr.subtypes[0].subtypes[0].element_name, None);
    }

    #[test]
    fn trailing_input_is_an_error() {
        let err = parse_type("array<str> junk").unwrap_err();
        assert_eq!(err.message, "unexpected trailing input");
        assert_eq!(err.offset, 11);
    }

    #[test]
    fn unclosed_subtype_list_is_an_error() {
        assert!(parse_type("array<str").is_err());
    }
}
