//! Operator call compilation and overload resolution

use crate::ast::{self, Span};
use crate::cast;
use crate::context::{ContextLevel, Env};
use crate::dispatch;
use crate::error::{CompileError, Result};
use crate::ir::{CallArg, Expr, OperatorCall, Set};
use crate::pathctx;
use crate::schema::{Operator, OperatorKind, Schema, TypeModifier, TypeRef};
use crate::setgen;

/// Compile the operands of `op_name`, pick the cheapest applicable overload
/// and build the typed call
pub fn compile_operator(
    op_name: &str,
    kind: OperatorKind,
    args: &[&ast::Expr],
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let schema = env.schema;
    let qualified = format!("std::{op_name}");
    let overloads = schema.operators().lookup(&qualified, kind);
    let Some(first) = overloads.first() else {
        return Err(CompileError::internal(format!(
            "no {kind:?} operator '{qualified}' in the catalog"
        )));
    };
    if first.params.len() != args.len() {
        return Err(CompileError::internal(format!(
            "operator '{qualified}' takes {} operands, got {}",
            first.params.len(),
            args.len()
        )));
    }

    // Modifiers are the same for every overload of one operator
    let mut compiled = Vec::with_capacity(args.len());
    for (arg, param) in args.iter().zip(&first.params) {
        compiled.push(compile_arg(arg, param.typemod, ctx, env)?);
    }

    let Some((op, poly)) = select_overload(overloads, &compiled, schema) else {
        return Err(no_matching_overload(op_name, kind, &compiled, span));
    };
    log::trace!("{qualified} resolved to ({:?}) -> {}", param_types(op), op.return_type);

    let args = compiled
        .into_iter()
        .zip(&op.params)
        .map(|(arg, param)| {
            let target = match (&poly, param.ty.is_generic()) {
                (Some(poly), true) => poly.clone(),
                _ => param.ty.clone(),
            };
            CallArg {
                expr: cast::implicit_cast(arg, &target, ctx, env),
            }
        })
        .collect();

    let typeref = match poly {
        Some(poly) if op.return_type.is_generic() => poly,
        _ => op.return_type.clone(),
    };
    let call = OperatorCall {
        func_shortname: op.name.clone(),
        operator_kind: op.kind,
        args,
        typeref: typeref.clone(),
        polymorphic: op.is_polymorphic(),
        params_typemods: op.params.iter().map(|p| p.typemod).collect(),
        return_typemod: op.return_typemod,
        backend: op.backend.clone(),
        span,
    };
    Ok(setgen::ensure_set(Expr::OperatorCall(call), typeref, ctx, env))
}

/// Operands are consumed, not output, so they are never exposed. SET OF
/// operands get their own fence; optional ones are marked as such.
fn compile_arg(
    arg: &ast::Expr,
    typemod: TypeModifier,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let mut argctx = ctx.new_level();
    argctx.expr_exposed = false;
    match typemod {
        TypeModifier::Singleton => dispatch::compile(arg, &argctx, env),
        TypeModifier::SetOf => {
            let subctx = argctx.newscope(env, true);
            let set = dispatch::compile(arg, &subctx, env)?;
            setgen::scoped_set(set, &subctx, env)
        }
        TypeModifier::Optional => {
            let subctx = argctx.newscope(env, false);
            let set = dispatch::compile(arg, &subctx, env)?;
            let set = setgen::scoped_set(set, &subctx, env)?;
            pathctx::mark_path_as_optional(&set.path_id, &subctx, env);
            Ok(set)
        }
    }
}

fn select_overload<'a>(
    overloads: &'a [Operator],
    args: &[Set],
    schema: &Schema,
) -> Option<(&'a Operator, Option<TypeRef>)> {
    overloads
        .iter()
        .filter_map(|op| {
            let (distance, poly) = match_overload(op, args, schema)?;
            Some((distance, op, poly))
        })
        .min_by_key(|(distance, _, _)| *distance)
        .map(|(_, op, poly)| (op, poly))
}

/// Total cast distance of the arguments to this overload, and the type bound
/// to its generic parameters
///
/// Empty sets match any parameter.
fn match_overload(op: &Operator, args: &[Set], schema: &Schema) -> Option<(u32, Option<TypeRef>)> {
    let mut total = 0;
    let mut poly: Option<TypeRef> = None;
    for (param, arg) in op.params.iter().zip(args) {
        if setgen::is_empty_set(arg) {
            continue;
        }
        let arg_type = setgen::get_set_type(arg);
        total += schema.cast_distance(arg_type, &param.ty)?;
        if param.ty.is_generic() {
            poly = Some(match poly {
                None => arg_type.clone(),
                Some(bound) => schema.common_supertype(&bound, arg_type)?,
            });
        }
    }
    Some((total, poly))
}

fn no_matching_overload(op_name: &str, kind: OperatorKind, args: &[Set], span: Span) -> CompileError {
    let message = match (kind, args) {
        (OperatorKind::Infix, [left, right]) => format!(
            "operator '{op_name}' cannot be applied to operands of type '{}' and '{}'",
            left.typeref, right.typeref
        ),
        (_, [operand]) => format!(
            "operator '{op_name}' cannot be applied to operand of type '{}'",
            operand.typeref
        ),
        _ => format!("operator '{op_name}' cannot be applied to these operands"),
    };
    CompileError::query(message, Some(span))
}

fn param_types(op: &Operator) -> Vec<String> {
    op.params.iter().map(|p| p.ty.to_string()).collect()
}
