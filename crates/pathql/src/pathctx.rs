//! Path identity helpers bound to the current context level

use crate::context::{ContextLevel, Env};
use crate::error::Result;
use crate::ir::{PathId, Set};

pub fn register_set_in_scope(set: &Set, ctx: &ContextLevel, env: &mut Env<'_>) -> Result<()> {
    env.scope_tree.register(set, ctx.scope)
}

pub fn mark_path_as_optional(path_id: &PathId, ctx: &ContextLevel, env: &mut Env<'_>) {
    env.scope_tree.mark_optional(path_id, ctx.scope);
}

/// Identity for a non-path expression, unique within the query
pub fn expression_path_id(hint: &str, ctx: &ContextLevel, env: &mut Env<'_>) -> PathId {
    let alias = env.aliases.get(hint);
    PathId::root(alias, ctx.path_id_namespace.as_deref())
}
