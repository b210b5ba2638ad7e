//! Compilation of non-statement expressions
//!
//! One handler per surface form, called from [`crate::dispatch::compile`].
//! Operator calls are folded here when every operand is constant, with a
//! narrow reassociation for `+` and `*` over real numbers.

use crate::ast::{
    self, BinOp, Constant, IndirectionEl, IsOp, Span, TypeExpr, UnaryOp,
};
use crate::cardinality::{self, CardinalityField};
use crate::cast;
use crate::context::{ContextLevel, Env};
use crate::dispatch;
use crate::error::{CompileError, Result};
use crate::func;
use crate::ir::{ConstValue, Expr, OperatorCall, Set, TupleElement};
use crate::pathctx;
use crate::schema::{OperatorKind, PseudoType, Schema, TypeRef};
use crate::setgen;
use crate::staeval;
use crate::typegen;

// ============ Operators ============

pub fn compile_binop(
    left: &ast::Expr,
    op: BinOp,
    right: &ast::Expr,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let call = func::compile_operator(op.name(), OperatorKind::Infix, &[left, right], span, ctx, env)?;
    Ok(fold_if_enabled(call, ctx, env))
}

pub fn compile_unaryop(
    op: UnaryOp,
    operand: &ast::Expr,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let call = func::compile_operator(op.name(), OperatorKind::Prefix, &[operand], span, ctx, env)?;
    Ok(fold_if_enabled(call, ctx, env))
}

fn fold_if_enabled(set: Set, ctx: &ContextLevel, env: &mut Env<'_>) -> Set {
    if !ctx.constant_folding {
        return set;
    }
    let folded = set
        .as_operator_call()
        .and_then(|call| try_fold_operator_call(call, ctx, env));
    folded.unwrap_or(set)
}

// ============ Constant folding ============

fn try_fold_operator_call(
    call: &OperatorCall,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Option<Set> {
    match staeval::evaluate(call, env.schema) {
        Ok(value) => {
            log::debug!("folded {} call into {value:?}", call.func_shortname);
            Some(constant_set(value, call.typeref.clone(), ctx, env))
        }
        Err(staeval::Unsupported) if is_associative(call, env.schema) => {
            try_fold_associative_binop(call, ctx, env)
        }
        Err(staeval::Unsupported) => None,
    }
}

/// `+` and `*` as infix operators over real numbers
fn is_associative(call: &OperatorCall, schema: &Schema) -> bool {
    let anyreal = TypeRef::Pseudo(PseudoType::AnyReal);
    matches!(call.func_shortname.as_str(), "std::+" | "std::*")
        && call.operator_kind == OperatorKind::Infix
        && call
            .args
            .iter()
            .all(|arg| schema.issubclass(&arg.expr.typeref, &anyreal))
}

/// Rewrite `CONST ⊕ (OTHER_CONST ⊕ X)` into `(CONST ⊕ OTHER_CONST) ⊕ X`,
/// with the constants on either side of their call
///
/// A constant under an implicit cast counts as a constant.
fn try_fold_associative_binop(
    call: &OperatorCall,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Option<Set> {
    let [first, second] = call.args.as_slice() else {
        return None;
    };
    let schema = env.schema;
    let foldable = |set: &Set| staeval::evaluate_set(set, schema).is_ok();
    let (mut my_const, mut other_binop) = (&first.expr, &second.expr);
    if foldable(other_binop) {
        std::mem::swap(&mut my_const, &mut other_binop);
    }
    if !foldable(my_const) {
        return None;
    }

    let inner = other_binop.as_operator_call()?;
    if inner.func_shortname != call.func_shortname || inner.operator_kind != OperatorKind::Infix {
        return None;
    }
    let [inner_first, inner_second] = inner.args.as_slice() else {
        return None;
    };
    let (mut other_const, mut operand) = (&inner_first.expr, &inner_second.expr);
    if foldable(operand) {
        std::mem::swap(&mut other_const, &mut operand);
    }
    if !foldable(other_const) {
        return None;
    }

    let constants = call.with_args(vec![other_const.clone(), my_const.clone()]);
    let value = staeval::evaluate(&constants, schema).ok()?;
    log::debug!("reassociated {} to fold its constants", call.func_shortname);

    let new_const = constant_set(value, call.typeref.clone(), ctx, env);
    let folded = call.with_args(vec![new_const, operand.clone()]);
    Some(setgen::ensure_set(
        Expr::OperatorCall(folded),
        call.typeref.clone(),
        ctx,
        env,
    ))
}

fn constant_set(value: ConstValue, typeref: TypeRef, ctx: &ContextLevel, env: &mut Env<'_>) -> Set {
    setgen::ensure_set(Expr::Constant(value), typeref, ctx, env)
}

// ============ Literals ============

pub fn compile_constant(
    constant: &Constant,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let (value, type_name) = match constant {
        Constant::String(s) | Constant::RawString(s) => (ConstValue::Str(s.clone()), "std::str"),
        Constant::Integer { value, is_negative } => integer_constant(value, *is_negative),
        Constant::Float { value, is_negative } => {
            let parsed: f64 = value.replace('_', "").parse().map_err(|_| {
                CompileError::query(format!("invalid float literal '{value}'"), Some(span))
            })?;
            let signed = if *is_negative { -parsed } else { parsed };
            (ConstValue::Float(signed), "std::float64")
        }
        Constant::Boolean(b) => (ConstValue::Bool(*b), "std::bool"),
        Constant::Bytes(body) => {
            let bytes = decode_bytes(body).map_err(|e| {
                CompileError::query(format!("invalid bytes literal: {e}"), Some(span))
            })?;
            (ConstValue::Bytes(bytes), "std::bytes")
        }
    };
    Ok(constant_set(value, TypeRef::scalar(type_name), ctx, env))
}

/// `int64` when the signed value fits in `[-2^63, 2^63)`, `decimal` otherwise
fn integer_constant(digits: &str, is_negative: bool) -> (ConstValue, &'static str) {
    let digits = digits.replace('_', "");
    let fits = digits.parse::<u64>().ok().and_then(|v| {
        if is_negative {
            (v <= 1u64 << 63).then(|| (v as i64).wrapping_neg())
        } else {
            i64::try_from(v).ok()
        }
    });
    match fits {
        Some(v) => (ConstValue::Int(v), "std::int64"),
        None if is_negative => (ConstValue::Decimal(format!("-{digits}")), "std::decimal"),
        None => (ConstValue::Decimal(digits), "std::decimal"),
    }
}

/// Decode the body of a `b'...'` literal
///
/// Recognizes the usual backslash escapes, `\xHH` and up to three octal
/// digits; unknown escapes are kept verbatim.
fn decode_bytes(body: &str) -> std::result::Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            if !c.is_ascii() {
                return Err(format!("non-ASCII character '{c}'"));
            }
            out.push(c as u8);
            continue;
        }
        match chars.next() {
            None => return Err("trailing backslash".to_string()),
            Some('\n') => {}
            Some('\\') => out.push(b'\\'),
            Some('\'') => out.push(b'\''),
            Some('"') => out.push(b'"'),
            Some('a') => out.push(0x07),
            Some('b') => out.push(0x08),
            Some('f') => out.push(0x0c),
            Some('n') => out.push(b'\n'),
            Some('r') => out.push(b'\r'),
            Some('t') => out.push(b'\t'),
            Some('v') => out.push(0x0b),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                let byte = (hex.len() == 2)
                    .then(|| u8::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .ok_or_else(|| format!("invalid \\x escape '\\x{hex}'"))?;
                out.push(byte);
            }
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match chars.peek().and_then(|n| n.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                let byte = u8::try_from(value)
                    .map_err(|_| format!("octal escape value {value:o} out of range"))?;
                out.push(byte);
            }
            Some(other) => {
                if !other.is_ascii() {
                    return Err(format!("non-ASCII character '{other}'"));
                }
                out.push(b'\\');
                out.push(other as u8);
            }
        }
    }
    Ok(out)
}

// ============ Collections ============

pub fn compile_tuple(elements: &[ast::Expr], ctx: &ContextLevel, env: &mut Env<'_>) -> Result<Set> {
    let mut compiled = Vec::with_capacity(elements.len());
    for (i, element) in elements.iter().enumerate() {
        compiled.push(TupleElement {
            name: i.to_string(),
            val: dispatch::compile(element, ctx, env)?,
        });
    }
    Ok(setgen::new_tuple_set(compiled, false, ctx, env))
}

pub fn compile_named_tuple(
    elements: &[ast::TupleElement],
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let mut compiled = Vec::with_capacity(elements.len());
    for element in elements {
        compiled.push(TupleElement {
            name: element.name.clone(),
            val: dispatch::compile(&element.val, ctx, env)?,
        });
    }
    Ok(setgen::new_tuple_set(compiled, true, ctx, env))
}

pub fn compile_array(
    elements: &[ast::Expr],
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let mut compiled = Vec::with_capacity(elements.len());
    for element in elements {
        let set = dispatch::compile(element, ctx, env)?;
        if setgen::get_set_type(&set).is_array() {
            return Err(CompileError::query(
                "nested arrays are not supported",
                Some(element.span),
            ));
        }
        compiled.push(set);
    }
    setgen::new_array_set(compiled, span, ctx, env)
}

/// `{}`, `{a}` and `{a, b, ...}`
///
/// A single element is fenced as if it were `a UNION {}`; two or more are
/// flattened and rewritten into a left-associative `UNION` chain.
pub fn compile_set(
    elements: &[ast::Expr],
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let flat = flatten_set(elements);
    match flat.as_slice() {
        [] => Ok(setgen::new_empty_set(ctx, env)),
        [element] => {
            let subctx = ctx.newscope(env, true);
            let set = dispatch::compile(element, &subctx, env)?;
            setgen::scoped_set(set, &subctx, env)
        }
        [first, second, rest @ ..] => {
            let mut union = ast::Expr::clone(first)
                .binop(BinOp::Union, ast::Expr::clone(second))
                .at(span);
            for element in rest {
                union = union
                    .binop(BinOp::Union, ast::Expr::clone(element))
                    .at(span);
            }
            dispatch::compile(&union, ctx, env)
        }
    }
}

fn flatten_set(elements: &[ast::Expr]) -> Vec<&ast::Expr> {
    let mut flat = Vec::with_capacity(elements.len());
    for element in elements {
        match &element.kind {
            ast::ExprKind::Set(inner) => flat.extend(flatten_set(inner)),
            _ => flat.push(element),
        }
    }
    flat
}

// ============ Casts and parameters ============

pub fn compile_type_cast(
    operand: &ast::Expr,
    target: &TypeExpr,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let target_type = typegen::type_to_typeref(target, env)?;
    match &operand.kind {
        ast::ExprKind::Array(elements) if elements.is_empty() && target_type.is_array() => {
            Ok(setgen::ensure_set(Expr::EmptyArray, target_type, ctx, env))
        }
        ast::ExprKind::Parameter { name } => {
            compile_typed_parameter(name, target_type, operand.span, ctx, env)
        }
        _ => {
            // Exposed so nested casts to shape-bearing types materialize shapes
            let mut subctx = ctx.new_level();
            subctx.expr_exposed = true;
            let set = dispatch::compile(operand, &subctx, env)?;
            cast::compile_cast(set, &target_type, operand.span, ctx, env)
        }
    }
}

/// `<T>$name`: the first cast of a parameter declares its type
fn compile_typed_parameter(
    name: &str,
    typeref: TypeRef,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    check_parameters_allowed(ctx, span)?;
    match env.query_parameters.get(name) {
        None => {
            if let Some(first) = env.query_parameters.keys().next() {
                if is_positional(first) && !is_positional(name) {
                    return Err(CompileError::query(
                        "cannot combine positional and named parameters in the same query",
                        Some(span),
                    ));
                }
                if !is_positional(first) && is_positional(name) {
                    return Err(CompileError::query("expected a named argument", Some(span)));
                }
            }
            log::debug!("parameter ${name} declared as {typeref}");
            env.query_parameters.insert(name.to_string(), typeref.clone());
        }
        Some(first_type) => {
            if !env.schema.explicitly_castable(first_type, &typeref) {
                return Err(CompileError::query(
                    format!("cannot cast {first_type} to {typeref}"),
                    Some(span),
                ));
            }
        }
    }
    Ok(setgen::ensure_set(
        Expr::Parameter {
            name: name.to_string(),
        },
        typeref,
        ctx,
        env,
    ))
}

/// Bare `$name`, typed by an earlier cast of the same parameter
pub fn compile_parameter(
    name: &str,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    check_parameters_allowed(ctx, span)?;
    let typeref = env.query_parameters.get(name).cloned().ok_or_else(|| {
        CompileError::query(
            format!("missing a type cast before the parameter ${name}"),
            Some(span),
        )
    })?;
    Ok(setgen::ensure_set(
        Expr::Parameter {
            name: name.to_string(),
        },
        typeref,
        ctx,
        env,
    ))
}

fn check_parameters_allowed(ctx: &ContextLevel, span: Span) -> Result<()> {
    if ctx.func.is_some() {
        return Err(CompileError::query(
            "\"$parameters\" cannot be used in functions",
            Some(span),
        ));
    }
    Ok(())
}

fn is_positional(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

// ============ Type checks ============

/// `expr[IS Type]`
pub fn compile_type_filter(
    operand: &ast::Expr,
    target: &TypeExpr,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let arg = dispatch::compile(operand, &ctx.new_level(), env)?;
    let arg_type = setgen::get_set_type(&arg);
    if !arg_type.is_object() {
        return Err(CompileError::query(
            format!("invalid type filter operand: {arg_type} is not an object type"),
            Some(operand.span),
        ));
    }
    let target_type = typegen::object_type(target, "invalid type filter operand", env)?;
    Ok(setgen::class_indirection_set(arg, target_type, env))
}

/// `expr IS Type`
///
/// Object operands are checked at run time through their `__type__` link;
/// anything else is decided here.
pub fn compile_is_op(
    left: &ast::Expr,
    op: IsOp,
    right: &TypeExpr,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let left = dispatch::compile(left, ctx, env)?;
    let right_type = typegen::type_to_typeref(right, env)?;
    let negated = op == IsOp::IsNot;

    let left_type = setgen::get_set_type(&left);
    let (left, result) = if left_type.is_object() {
        let type_set = setgen::ptr_step_set(left, "__type__", span, env)?;
        pathctx::register_set_in_scope(&type_set, ctx, env)?;
        (type_set, None)
    } else {
        if left_type.is_collection() && left_type.contains_object() {
            return Err(CompileError::query(
                "type checks on non-primitive collections are not supported",
                Some(span),
            ));
        }
        let is_subclass = env.schema.issubclass(left_type, &right_type);
        (left, Some(is_subclass))
    };

    Ok(setgen::ensure_set(
        Expr::TypeCheck {
            left: Box::new(left),
            right: right_type,
            negated,
            result,
        },
        TypeRef::scalar("std::bool"),
        ctx,
        env,
    ))
}

pub fn compile_introspect(target: &TypeExpr, ctx: &ContextLevel, env: &mut Env<'_>) -> Result<Set> {
    let typeref = typegen::type_to_typeref(target, env)?;
    let unsupported = if env.schema.is_view(&typeref) {
        Some("cannot introspect views")
    } else if typeref.is_collection() {
        Some("cannot introspect collection types")
    } else if typeref.is_generic() {
        Some("cannot introspect generic types")
    } else {
        None
    };
    if let Some(message) = unsupported {
        return Err(CompileError::query(message, Some(target.span)));
    }

    let meta = if typeref.is_object() {
        "schema::ObjectType"
    } else {
        "schema::ScalarType"
    };
    Ok(setgen::ensure_set(
        Expr::TypeIntrospection { target: typeref },
        TypeRef::object(meta),
        ctx,
        env,
    ))
}

// ============ Conditionals ============

pub fn compile_if_else(
    condition: &ast::Expr,
    if_expr: &ast::Expr,
    else_expr: &ast::Expr,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let condition = dispatch::compile(condition, ctx, env)?;
    let if_set = compile_fenced_branch(if_expr, ctx, env)?;
    let else_set = compile_fenced_branch(else_expr, ctx, env)?;

    let bool_type = TypeRef::scalar("std::bool");
    if !env.schema.issubclass(&condition.typeref, &bool_type) {
        return Err(CompileError::query(
            format!(
                "if/else condition must be of type {bool_type}, got: {}",
                condition.typeref
            ),
            Some(span),
        ));
    }

    let result_type = if setgen::is_empty_set(&else_set) {
        Some(if_set.typeref.clone())
    } else if setgen::is_empty_set(&if_set) {
        Some(else_set.typeref.clone())
    } else {
        env.schema.common_supertype(&if_set.typeref, &else_set.typeref)
    };
    let result_type = result_type.ok_or_else(|| {
        CompileError::query(
            format!(
                "IF/ELSE operator cannot be applied to operands of type '{}' and '{}'",
                if_set.typeref, else_set.typeref
            ),
            Some(span),
        )
    })?;

    let (if_id, else_id) = (if_set.id, else_set.id);
    let set = setgen::ensure_set(
        Expr::IfElse {
            condition: Box::new(condition),
            if_expr: Box::new(if_set),
            else_expr: Box::new(else_set),
            if_expr_card: None,
            else_expr_card: None,
        },
        result_type,
        ctx,
        env,
    );
    cardinality::defer_cardinality(set.id, CardinalityField::IfExprCard, if_id, ctx, env);
    cardinality::defer_cardinality(set.id, CardinalityField::ElseExprCard, else_id, ctx, env);
    Ok(set)
}

fn compile_fenced_branch(branch: &ast::Expr, ctx: &ContextLevel, env: &mut Env<'_>) -> Result<Set> {
    let subctx = ctx.newscope(env, true);
    let set = dispatch::compile(branch, &subctx, env)?;
    setgen::scoped_set(set, &subctx, env)
}

// ============ Indirection ============

/// `expr[i]`, `expr[a:b]`, applied left to right
pub fn compile_indirection(
    arg: &ast::Expr,
    indirection: &[IndirectionEl],
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let mut node = dispatch::compile(arg, ctx, env)?;
    for el in indirection {
        node = match el {
            IndirectionEl::Index(index) => {
                let index_set = dispatch::compile(index, ctx, env)?;
                let result_type =
                    index_result_type(&node.typeref, &index_set.typeref, index.span, env.schema)?;
                setgen::ensure_set(
                    Expr::IndexIndirection {
                        expr: Box::new(node),
                        index: Box::new(index_set),
                    },
                    result_type,
                    ctx,
                    env,
                )
            }
            IndirectionEl::Slice { start, stop } => {
                let start = compile_slice_bound(start.as_ref(), ctx, env)?;
                let stop = compile_slice_bound(stop.as_ref(), ctx, env)?;
                if !is_sliceable(&node.typeref, env.schema) {
                    return Err(CompileError::query(
                        format!("cannot slice a value of type '{}'", node.typeref),
                        Some(arg.span),
                    ));
                }
                let typeref = node.typeref.clone();
                setgen::ensure_set(
                    Expr::SliceIndirection {
                        expr: Box::new(node),
                        start: start.map(Box::new),
                        stop: stop.map(Box::new),
                    },
                    typeref,
                    ctx,
                    env,
                )
            }
        };
    }
    Ok(node)
}

/// An omitted bound stays unbounded
fn compile_slice_bound(
    bound: Option<&ast::Expr>,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Option<Set>> {
    let Some(bound) = bound else {
        return Ok(None);
    };
    let set = dispatch::compile(bound, ctx, env)?;
    if !is_integer(&set.typeref, env.schema) {
        return Err(CompileError::query(
            format!("slice bounds must be integers, got '{}'", set.typeref),
            Some(bound.span),
        ));
    }
    Ok(Some(set))
}

fn index_result_type(base: &TypeRef, index: &TypeRef, span: Span, schema: &Schema) -> Result<TypeRef> {
    let int_index = is_integer(index, schema);
    let result = match base {
        TypeRef::Array(element) if int_index => Some((**element).clone()),
        TypeRef::Scalar(name) => match schema.material_scalar(name).as_str() {
            "std::str" | "std::bytes" if int_index => Some(base.clone()),
            "std::json" if int_index || schema.issubclass(index, &TypeRef::scalar("std::str")) => {
                Some(base.clone())
            }
            _ => None,
        },
        _ => None,
    };
    result.ok_or_else(|| {
        CompileError::query(format!("cannot index '{base}' by '{index}'"), Some(span))
    })
}

fn is_sliceable(base: &TypeRef, schema: &Schema) -> bool {
    match base {
        TypeRef::Array(_) => true,
        TypeRef::Scalar(name) => matches!(
            schema.material_scalar(name).as_str(),
            "std::str" | "std::bytes" | "std::json"
        ),
        _ => false,
    }
}

fn is_integer(ty: &TypeRef, schema: &Schema) -> bool {
    schema.issubclass(ty, &TypeRef::Pseudo(PseudoType::AnyInt))
}

// ============ Scope markers ============

/// `DETACHED expr`: compiled with no view of the enclosing bindings
pub fn compile_detached(inner: &ast::Expr, ctx: &ContextLevel, env: &mut Env<'_>) -> Result<Set> {
    let subctx = ctx.detached(env);
    dispatch::compile(inner, &subctx, env)
}

pub fn compile_optional(inner: &ast::Expr, ctx: &ContextLevel, env: &mut Env<'_>) -> Result<Set> {
    let set = dispatch::compile(inner, ctx, env)?;
    let set = setgen::scoped_set(set, ctx, env)?;
    pathctx::mark_path_as_optional(&set.path_id, ctx, env);
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literal_range() {
        assert_eq!(
            integer_constant("9223372036854775807", false),
            (ConstValue::Int(i64::MAX), "std::int64")
        );
        assert_eq!(
            integer_constant("9223372036854775808", false),
            (ConstValue::Decimal("9223372036854775808".into()), "std::decimal")
        );
        assert_eq!(
            integer_constant("9223372036854775808", true),
            (ConstValue::Int(i64::MIN), "std::int64")
        );
        assert_eq!(
            integer_constant("9223372036854775809", true),
            (ConstValue::Decimal("-9223372036854775809".into()), "std::decimal")
        );
    }

    #[test]
    fn bytes_escapes() {
        assert_eq!(decode_bytes(r"ab\x00\n").unwrap(), b"ab\x00\n".to_vec());
        assert_eq!(decode_bytes(r"\101\7").unwrap(), vec![b'A', 7]);
        assert_eq!(decode_bytes(r"\q").unwrap(), b"\\q".to_vec());
        assert!(decode_bytes(r"\x4").is_err());
        assert!(decode_bytes("é").is_err());
        assert!(decode_bytes("\\").is_err());
    }

    #[test]
    fn nested_sets_flatten_recursively() {
        let set = vec![
            ast::Expr::int(1),
            ast::Expr::set(vec![ast::Expr::int(2), ast::Expr::set(vec![ast::Expr::int(3)])]),
            ast::Expr::set(vec![]),
        ];
        let flat = flatten_set(&set);
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[2], &ast::Expr::int(3));
    }
}
