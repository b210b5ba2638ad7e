//! Set construction and path compilation

use crate::ast::{Path, PathStep, Span};
use crate::cast;
use crate::context::{ContextLevel, Env};
use crate::error::{CompileError, Result};
use crate::ir::{Expr, PathId, Set, TupleElement};
use crate::pathctx;
use crate::schema::TypeRef;
use crate::typegen;

pub fn new_set(expr: Expr, typeref: TypeRef, path_id: PathId, env: &mut Env<'_>) -> Set {
    Set {
        id: env.next_set_id(),
        path_id,
        typeref,
        expr,
    }
}

/// Wrap an IR expression in a set with a fresh expression identity
pub fn ensure_set(expr: Expr, typeref: TypeRef, ctx: &ContextLevel, env: &mut Env<'_>) -> Set {
    let path_id = pathctx::expression_path_id("expr", ctx, env);
    new_set(expr, typeref, path_id, env)
}

/// Bind a set compiled in a fresh scope to that scope's frame
///
/// A set that already belongs to an inner frame keeps it.
pub fn scoped_set(set: Set, ctx: &ContextLevel, env: &mut Env<'_>) -> Result<Set> {
    if env.scope_tree.scope_of(set.id).is_none() {
        pathctx::register_set_in_scope(&set, ctx, env)?;
    }
    Ok(set)
}

pub fn new_empty_set(ctx: &ContextLevel, env: &mut Env<'_>) -> Set {
    let path_id = pathctx::expression_path_id("e", ctx, env);
    new_set(Expr::EmptySet, TypeRef::anytype(), path_id, env)
}

pub fn is_empty_set(set: &Set) -> bool {
    matches!(set.expr, Expr::EmptySet)
}

pub fn get_set_type(set: &Set) -> &TypeRef {
    &set.typeref
}

pub fn new_tuple_set(
    elements: Vec<TupleElement>,
    named: bool,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Set {
    let typeref = TypeRef::Tuple {
        named,
        elements: elements
            .iter()
            .map(|e| (e.name.clone(), e.val.typeref.clone()))
            .collect(),
    };
    ensure_set(Expr::Tuple { named, elements }, typeref, ctx, env)
}

/// Array of the elements' common type, casting elements up to it
pub fn new_array_set(
    elements: Vec<Set>,
    span: Span,
    ctx: &ContextLevel,
    env: &mut Env<'_>,
) -> Result<Set> {
    let schema = env.schema;
    let mut element_type: Option<TypeRef> = None;
    for el in elements.iter().filter(|el| !is_empty_set(el)) {
        element_type = Some(match element_type {
            None => el.typeref.clone(),
            Some(current) => schema
                .common_supertype(&current, &el.typeref)
                .ok_or_else(|| {
                    CompileError::query(
                        format!(
                            "array elements of types '{current}' and '{}' have no common type",
                            el.typeref
                        ),
                        Some(span),
                    )
                })?,
        });
    }
    let element_type = element_type.unwrap_or_else(TypeRef::anytype);
    let elements = elements
        .into_iter()
        .map(|el| cast::implicit_cast(el, &element_type, ctx, env))
        .collect();
    Ok(ensure_set(
        Expr::Array { elements },
        TypeRef::array(element_type),
        ctx,
        env,
    ))
}

/// Follow an outbound pointer from an object set
pub fn ptr_step_set(source: Set, ptr_name: &str, span: Span, env: &mut Env<'_>) -> Result<Set> {
    let schema = env.schema;
    let TypeRef::Object(object) = &source.typeref else {
        return Err(CompileError::query(
            "invalid property reference on a primitive type expression",
            Some(span),
        ));
    };
    let ptr = schema.get_pointer(object, ptr_name).ok_or_else(|| {
        CompileError::query(
            format!("object type '{object}' has no link or property '{ptr_name}'"),
            Some(span),
        )
    })?;

    let path_id = source.path_id.extend(format!(".{ptr_name}"));
    let expr = Expr::PointerStep {
        source: Box::new(source),
        ptr_name: ptr_name.to_string(),
        kind: ptr.kind,
        cardinality: ptr.cardinality,
        required: ptr.required,
    };
    Ok(new_set(expr, ptr.target.clone(), path_id, env))
}

/// Narrow an object set to a subtype: `source[IS Target]`
pub fn class_indirection_set(source: Set, target: TypeRef, env: &mut Env<'_>) -> Set {
    let path_id = source.path_id.extend(format!("[IS {target}]"));
    new_set(
        Expr::TypeIntersection {
            source: Box::new(source),
        },
        target,
        path_id,
        env,
    )
}

/// Resolve `Type.ptr[IS T].ptr` and bind the result in the current scope
pub fn compile_path(path: &Path, span: Span, ctx: &ContextLevel, env: &mut Env<'_>) -> Result<Set> {
    let mut steps = path.steps.iter();
    let mut current = match steps.next() {
        Some(PathStep::ObjectRef { module, name }) => {
            let found = env
                .schema
                .get_type(module.as_deref(), name, &env.options.default_module);
            match found {
                Some(TypeRef::Object(object)) => {
                    let path_id = PathId::root(object.clone(), ctx.path_id_namespace.as_deref());
                    new_set(Expr::ObjectRoot, TypeRef::Object(object), path_id, env)
                }
                Some(other) => {
                    return Err(CompileError::query(
                        format!("'{other}' is not an object type and cannot start a path"),
                        Some(span),
                    ));
                }
                None => {
                    let qualified = match module {
                        Some(module) => format!("{module}::{name}"),
                        None => name.clone(),
                    };
                    return Err(CompileError::query(
                        format!("object type '{qualified}' does not exist"),
                        Some(span),
                    ));
                }
            }
        }
        Some(_) => {
            return Err(CompileError::internal(
                "path does not start with an object reference",
            ));
        }
        None => return Err(CompileError::internal("empty path")),
    };

    for step in steps {
        current = match step {
            PathStep::Ptr { name } => ptr_step_set(current, name, span, env)?,
            PathStep::TypeIntersection(texpr) => {
                let target = typegen::object_type(texpr, "invalid type intersection operand", env)?;
                class_indirection_set(current, target, env)
            }
            PathStep::ObjectRef { .. } => {
                return Err(CompileError::internal(
                    "object reference in the middle of a path",
                ));
            }
        };
    }

    pathctx::register_set_in_scope(&current, ctx, env)?;
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilerOptions;
    use crate::ir::ConstValue;
    use crate::schema::{ObjectTypeDef, Schema};

    fn schema() -> Schema {
        Schema::std()
            .with_object_type(
                ObjectTypeDef::new("User")
                    .required_property("name", "str")
                    .multi_link("friends", "User"),
            )
            .unwrap()
    }

    fn constant(value: ConstValue, ty: &str, ctx: &ContextLevel, env: &mut Env<'_>) -> Set {
        ensure_set(Expr::Constant(value), TypeRef::scalar(ty), ctx, env)
    }

    #[test]
    fn array_elements_are_cast_to_common_type() {
        let schema = schema();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let elements = vec![
            constant(ConstValue::Int(1), "std::int64", &ctx, &mut env),
            constant(ConstValue::Float(2.5), "std::float64", &ctx, &mut env),
        ];
        let array = new_array_set(elements, Span::default(), &ctx, &mut env).unwrap();
        assert_eq!(array.typeref, TypeRef::array(TypeRef::scalar("std::float64")));
        let Expr::Array { elements } = &array.expr else {
            panic!("expected array");
        };
        assert!(matches!(elements[0].expr, Expr::TypeCast { implicit: true, .. }));
        assert!(elements[1].is_constant());
    }

    #[test]
    fn array_without_common_type_is_rejected() {
        let schema = schema();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let elements = vec![
            constant(ConstValue::Int(1), "std::int64", &ctx, &mut env),
            constant(ConstValue::Str("a".into()), "std::str", &ctx, &mut env),
        ];
        let err = new_array_set(elements, Span::new(0, 8), &ctx, &mut env).unwrap_err();
        assert_eq!(
            err.message(),
            "array elements of types 'std::int64' and 'std::str' have no common type"
        );
    }

    #[test]
    fn path_steps_extend_identity() {
        let schema = schema();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let path = match crate::ast::Expr::path(&["User", "friends", "name"]).kind {
            crate::ast::ExprKind::Path(path) => path,
            _ => unreachable!(),
        };
        let set = compile_path(&path, Span::default(), &ctx, &mut env).unwrap();
        assert_eq!(set.typeref, TypeRef::scalar("std::str"));
        assert_eq!(set.path_id.to_string(), "(default::User.friends.name)");
        assert!(env.scope_tree.is_visible(&set.path_id, ctx.scope));
    }

    #[test]
    fn pointer_on_scalar_is_rejected() {
        let schema = schema();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let source = constant(ConstValue::Int(1), "std::int64", &ctx, &mut env);
        let err = ptr_step_set(source, "name", Span::default(), &mut env).unwrap_err();
        assert_eq!(
            err.message(),
            "invalid property reference on a primitive type expression"
        );
    }

    #[test]
    fn unknown_pointer_names_the_type() {
        let schema = schema();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let ctx = ContextLevel::root(&env);
        let path = match crate::ast::Expr::path(&["User", "email"]).kind {
            crate::ast::ExprKind::Path(path) => path,
            _ => unreachable!(),
        };
        let err = compile_path(&path, Span::default(), &ctx, &mut env).unwrap_err();
        assert_eq!(
            err.message(),
            "object type 'default::User' has no link or property 'email'"
        );
    }
}
