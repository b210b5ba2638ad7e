//! Single recursive entry point: one handler per expression kind

use crate::ast::{Expr, ExprKind};
use crate::context::{ContextLevel, Env};
use crate::error::Result;
use crate::expr;
use crate::ir::Set;
use crate::setgen;

pub fn compile(node: &Expr, ctx: &ContextLevel, env: &mut Env<'_>) -> Result<Set> {
    log::debug!("compile {} at {}", kind_name(&node.kind), node.span);
    let span = node.span;
    match &node.kind {
        ExprKind::BinOp { left, op, right } => expr::compile_binop(left, *op, right, span, ctx, env),
        ExprKind::UnaryOp { op, operand } => expr::compile_unaryop(*op, operand, span, ctx, env),
        ExprKind::Path(path) => setgen::compile_path(path, span, ctx, env),
        ExprKind::Constant(constant) => expr::compile_constant(constant, span, ctx, env),
        ExprKind::Tuple(elements) => expr::compile_tuple(elements, ctx, env),
        ExprKind::NamedTuple(elements) => expr::compile_named_tuple(elements, ctx, env),
        ExprKind::Array(elements) => expr::compile_array(elements, span, ctx, env),
        ExprKind::Set(elements) => expr::compile_set(elements, span, ctx, env),
        ExprKind::TypeCast { expr, target } => expr::compile_type_cast(expr, target, ctx, env),
        ExprKind::TypeFilter { expr, target } => expr::compile_type_filter(expr, target, ctx, env),
        ExprKind::IsOp { left, op, right } => expr::compile_is_op(left, *op, right, span, ctx, env),
        ExprKind::IfElse {
            condition,
            if_expr,
            else_expr,
        } => expr::compile_if_else(condition, if_expr, else_expr, span, ctx, env),
        ExprKind::Indirection { arg, indirection } => {
            expr::compile_indirection(arg, indirection, ctx, env)
        }
        ExprKind::Parameter { name } => expr::compile_parameter(name, span, ctx, env),
        ExprKind::Introspect(target) => expr::compile_introspect(target, ctx, env),
        ExprKind::Detached(inner) => expr::compile_detached(inner, ctx, env),
        ExprKind::Optional(inner) => expr::compile_optional(inner, ctx, env),
    }
}

fn kind_name(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::BinOp { .. } => "BinOp",
        ExprKind::UnaryOp { .. } => "UnaryOp",
        ExprKind::Path(_) => "Path",
        ExprKind::Constant(_) => "Constant",
        ExprKind::Tuple(_) => "Tuple",
        ExprKind::NamedTuple(_) => "NamedTuple",
        ExprKind::Array(_) => "Array",
        ExprKind::Set(_) => "Set",
        ExprKind::TypeCast { .. } => "TypeCast",
        ExprKind::TypeFilter { .. } => "TypeFilter",
        ExprKind::IsOp { .. } => "IsOp",
        ExprKind::IfElse { .. } => "IfElse",
        ExprKind::Indirection { .. } => "Indirection",
        ExprKind::Parameter { .. } => "Parameter",
        ExprKind::Introspect(_) => "Introspect",
        ExprKind::Detached(_) => "Detached",
        ExprKind::Optional(_) => "Optional",
    }
}
