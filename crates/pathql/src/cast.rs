//! Cast compilation

use crate::ast::Span;
use crate::context::{ContextLevel, Env};
use crate::error::{CompileError, Result};
use crate::ir::{Expr, Set};
use crate::schema::TypeRef;
use crate::setgen;

/// Explicit `<T>expr` cast of an already compiled set
pub fn compile_cast(
    set: Set,
    target: &TypeRef,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    if setgen::is_empty_set(&set) {
        return Ok(retype(set, target));
    }
    if set.typeref == *target {
        return Ok(set);
    }
    if target.is_generic() {
        return Err(CompileError::query(
            format!("cannot cast into generic type '{target}'"),
            Some(span),
        ));
    }
    if !env.schema.explicitly_castable(&set.typeref, target) {
        return Err(CompileError::query(
            format!("cannot cast '{}' to '{target}'", set.typeref),
            Some(span),
        ));
    }
    let serialize_shape =
        ctx.expr_exposed && env.schema.is_json(target) && set.typeref.contains_object();
    Ok(cast_set(set, target, false, serialize_shape, ctx, env))
}

/// Coerce a set to a type it implicitly casts to
///
/// Subtypes and generic targets pass through unchanged; empty sets take the
/// target type.
pub fn implicit_cast(set: Set, target: &TypeRef, ctx: &ContextLevel, env: &mut Env<'_>) -> Set {
    if setgen::is_empty_set(&set) {
        return retype(set, target);
    }
    if target.is_generic() || env.schema.issubclass(&set.typeref, target) {
        return set;
    }
    cast_set(set, target, true, false, ctx, env)
}

fn retype(set: Set, target: &TypeRef) -> Set {
    Set {
        typeref: target.clone(),
        ..set
    }
}

fn cast_set(
    set: Set,
    target: &TypeRef,
    implicit: bool,
    serialize_shape: bool,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Set {
    let from = set.typeref.clone();
    setgen::ensure_set(
        Expr::TypeCast {
            expr: Box::new(set),
            from,
            to: target.clone(),
            implicit,
            serialize_shape,
        },
        target.clone(),
        ctx,
        env,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilerOptions;
    use crate::ir::ConstValue;
    use crate::schema::{ObjectTypeDef, Schema};

    #[test]
    fn identical_cast_is_a_no_op() {
        let schema = Schema::std();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let int64 = TypeRef::scalar("std::int64");
        let set = setgen::ensure_set(Expr::Constant(ConstValue::Int(1)), int64.clone(), &ctx, &mut env);
        let id = set.id;
        let cast = compile_cast(set, &int64, Span::default(), &ctx, &mut env).unwrap();
        assert_eq!(cast.id, id);
    }

    #[test]
    fn empty_set_takes_target_type() {
        let schema = Schema::std();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let empty = setgen::new_empty_set(&ctx, &mut env);
        let str_t = TypeRef::scalar("std::str");
        let cast = compile_cast(empty, &str_t, Span::default(), &ctx, &mut env).unwrap();
        assert_eq!(cast.expr, Expr::EmptySet);
        assert_eq!(cast.typeref, str_t);
    }

    #[test]
    fn uncastable_pair_is_rejected() {
        let schema = Schema::std();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let set = setgen::ensure_set(
            Expr::Constant(ConstValue::Bytes(vec![1])),
            TypeRef::scalar("std::bytes"),
            &ctx,
            &mut env,
        );
        let err = compile_cast(set, &TypeRef::scalar("std::int64"), Span::new(1, 4), &ctx, &mut env)
            .unwrap_err();
        assert_eq!(err.message(), "cannot cast 'std::bytes' to 'std::int64'");
        assert_eq!(err.span(), Some(Span::new(1, 4)));
    }

    #[test]
    fn json_cast_of_object_serializes_shape_when_exposed() {
        let schema = Schema::std()
            .with_object_type(ObjectTypeDef::new("User"))
            .unwrap();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let json = TypeRef::scalar("std::json");
        let user = setgen::ensure_set(Expr::ObjectRoot, TypeRef::object("default::User"), &ctx, &mut env);
        let cast = compile_cast(user, &json, Span::default(), &ctx, &mut env).unwrap();
        assert!(matches!(cast.expr, Expr::TypeCast { serialize_shape: true, .. }));

        let mut hidden = ctx.new_level();
        hidden.expr_exposed = false;
        let user = setgen::ensure_set(Expr::ObjectRoot, TypeRef::object("default::User"), &ctx, &mut env);
        let cast = compile_cast(user, &json, Span::default(), &hidden, &mut env).unwrap();
        assert!(matches!(cast.expr, Expr::TypeCast { serialize_shape: false, .. }));
    }
}
