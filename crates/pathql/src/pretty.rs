//! Surface-syntax rendering of compiled IR
//!
//! Set ids and path ids are left out, so two compilations of equivalent
//! queries render identically.

use std::fmt;

use crate::ir::{ConstValue, Expr, Set};
use crate::schema::OperatorKind;

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Str(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Decimal(v) => write!(f, "{v}n"),
            ConstValue::Float(v) => write!(f, "{v:?}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
            ConstValue::Bytes(bytes) => {
                write!(f, "b'")?;
                for &b in bytes {
                    match b {
                        b'\\' => write!(f, "\\\\")?,
                        b'\'' => write!(f, "\\'")?,
                        0x20..=0x7e => write!(f, "{}", b as char)?,
                        _ => write!(f, "\\x{b:02x}")?,
                    }
                }
                write!(f, "'")
            }
        }
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expr {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::EmptySet => write!(f, "{{}}"),
            Expr::EmptyArray => write!(f, "<{}>[]", self.typeref),
            Expr::Parameter { name } => write!(f, "${name}"),
            Expr::OperatorCall(call) => {
                let op = call
                    .func_shortname
                    .strip_prefix("std::")
                    .unwrap_or(&call.func_shortname);
                match (call.operator_kind, call.args.as_slice()) {
                    (OperatorKind::Infix, [left, right]) => {
                        write!(f, "({} {op} {})", left.expr, right.expr)
                    }
                    (OperatorKind::Prefix, [operand]) if op.chars().all(char::is_alphabetic) => {
                        write!(f, "({op} {})", operand.expr)
                    }
                    (OperatorKind::Prefix, [operand]) => write!(f, "({op}{})", operand.expr),
                    (_, args) => {
                        write!(f, "{op}(")?;
                        write_list(f, args.iter().map(|a| &a.expr))?;
                        write!(f, ")")
                    }
                }
            }
            Expr::TypeCast { expr, to, .. } => write!(f, "<{to}>{expr}"),
            Expr::Tuple { named, elements } => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if *named {
                        write!(f, "{} := ", element.name)?;
                    }
                    write!(f, "{}", element.val)?;
                }
                if !*named && elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Expr::Array { elements } => {
                write!(f, "[")?;
                write_list(f, elements.iter())?;
                write!(f, "]")
            }
            Expr::IfElse {
                condition,
                if_expr,
                else_expr,
                ..
            } => write!(f, "({if_expr} IF {condition} ELSE {else_expr})"),
            Expr::TypeCheck {
                left,
                right,
                negated,
                ..
            } => {
                let op = if *negated { "IS NOT" } else { "IS" };
                write!(f, "({left} {op} {right})")
            }
            Expr::IndexIndirection { expr, index } => write!(f, "{expr}[{index}]"),
            Expr::SliceIndirection { expr, start, stop } => {
                write!(f, "{expr}[")?;
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                write!(f, ":")?;
                if let Some(stop) = stop {
                    write!(f, "{stop}")?;
                }
                write!(f, "]")
            }
            Expr::TypeIntrospection { target } => write!(f, "INTROSPECT {target}"),
            Expr::ObjectRoot => write!(f, "{}", self.typeref),
            Expr::PointerStep {
                source, ptr_name, ..
            } => write!(f, "{source}.{ptr_name}"),
            Expr::TypeIntersection { source } => write!(f, "{source}[IS {}]", self.typeref),
        }
    }
}

fn write_list<'a>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'a Set>) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants() {
        assert_eq!(ConstValue::Str("it's".into()).to_string(), r"'it\'s'");
        assert_eq!(ConstValue::Decimal("-12".into()).to_string(), "-12n");
        assert_eq!(ConstValue::Float(1.0).to_string(), "1.0");
        assert_eq!(ConstValue::Bytes(vec![b'a', 0]).to_string(), r"b'a\x00'");
    }
}
