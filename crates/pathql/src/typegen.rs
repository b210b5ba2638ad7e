//! Type expression resolution against the schema

use crate::ast::TypeExpr;
use crate::context::Env;
use crate::error::{CompileError, Result};
use crate::schema::TypeRef;

pub fn type_to_typeref(texpr: &TypeExpr, env: &Env<'_>) -> Result<TypeRef> {
    env.schema
        .resolve_type_expr(texpr, &env.options.default_module)
        .map_err(|e| CompileError::query(e.to_string(), Some(texpr.span)))
}

/// Resolve a type expression that must name an object type
pub fn object_type(texpr: &TypeExpr, what: &str, env: &Env<'_>) -> Result<TypeRef> {
    let typeref = type_to_typeref(texpr, env)?;
    if !typeref.is_object() {
        return Err(CompileError::query(
            format!("{what}: {typeref} is not an object type"),
            Some(texpr.span),
        ));
    }
    Ok(typeref)
}
