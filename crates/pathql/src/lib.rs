//! PathQL - expression compiler for a path-oriented query language
//!
//! Turns a parsed expression into typed IR: every node becomes a [`Set`]
//! with a type, a path id and a place in the scope tree. Constant operator
//! calls are folded along the way.
//!
//! ## Quick Start
//!
//! ```
//! use pathql::{ast::{BinOp, Expr}, compile, CompilerOptions, Schema};
//!
//! let schema = Schema::std();
//! let expr = Expr::int(40).binop(BinOp::Add, Expr::int(2));
//! let compiled = compile(&expr, &schema, CompilerOptions::new())?;
//! assert_eq!(compiled.result.to_string(), "42");
//! assert_eq!(compiled.result.typeref.to_string(), "std::int64");
//! # Ok::<(), pathql::CompileError>(())
//! ```
//!
//! ## Parameters
//!
//! `$name` must be cast on first use (`<str>$name`); later uses share its
//! type. [`CompiledExpr::parameters`] lists them in first-seen order.

pub mod ast;
mod cardinality;
mod cast;
mod context;
mod dispatch;
mod error;
mod expr;
mod func;
pub mod ir;
mod parse;
mod pathctx;
mod pretty;
pub mod schema;
mod scope;
mod setgen;
mod staeval;
mod typegen;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

// ============ Primary Public API ============

pub use cardinality::Cardinality;
pub use context::CompilerOptions;
pub use error::{CompileError, SchemaError};
pub use ir::Set;
pub use parse::{parse_type, ParseError};
pub use schema::{ObjectTypeDef, ScalarTypeDef, Schema, TypeRef};
pub use scope::{ScopeId, ScopeTree};

/// Result of compiling one expression
#[derive(Debug, Clone, Serialize)]
pub struct CompiledExpr {
    pub result: Set,
    pub cardinality: Cardinality,
    pub parameters: IndexMap<String, TypeRef>,
    #[serde(skip)]
    pub scope_tree: ScopeTree,
}

impl CompiledExpr {
    /// Declared query parameters and their types, in first-seen order
    pub fn parameters(&self) -> &IndexMap<String, TypeRef> {
        &self.parameters
    }
}

/// Compile an expression against `schema`
pub fn compile(
    expr: &ast::Expr,
    schema: &Schema,
    options: CompilerOptions,
) -> Result<CompiledExpr, CompileError> {
    let mut env = context::Env::new(schema, options);
    let ctx = context::ContextLevel::root(&env);
    let mut result = dispatch::compile(expr, &ctx, &mut env)?;

    let deferred = std::mem::take(&mut env.deferred);
    log::debug!("resolving {} deferred cardinalities", deferred.len());
    cardinality::resolve(&mut result, deferred)?;
    let cardinality = cardinality::infer_cardinality(&result);

    Ok(CompiledExpr {
        result,
        cardinality,
        parameters: env.query_parameters,
        scope_tree: env.scope_tree,
    })
}

/// Compile `<type_text>expr`, parsing the target type first
///
/// ```
/// use pathql::{ast::Expr, compile_as, CompilerOptions, Schema};
///
/// let compiled = compile_as(&Expr::str("7"), "int64", &Schema::std(), CompilerOptions::new())?;
/// assert_eq!(compiled.result.to_string(), "7");
/// # Ok::<(), pathql::PathqlError>(())
/// ```
pub fn compile_as(
    expr: &ast::Expr,
    type_text: &str,
    schema: &Schema,
    options: CompilerOptions,
) -> Result<CompiledExpr, PathqlError> {
    let target = parse_type(type_text)?;
    let cast = ast::Expr::cast(target, expr.clone());
    Ok(compile(&cast, schema, options)?)
}

// ============ Errors ============

#[derive(Error, Debug)]
pub enum PathqlError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}
