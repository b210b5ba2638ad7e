//! Compilation environment
//!
//! [`Env`] is per query and threaded by `&mut` through the whole walk: the
//! schema, the parameter table, the scope tree and the deferred cardinality
//! queue. [`ContextLevel`] is per lexical nesting and passed by reference;
//! child levels are new values, so their effects end when they go out of
//! scope.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::cardinality::CardinalityQueue;
use crate::ir::SetId;
use crate::schema::{Schema, TypeRef, DEFAULT_MODULE};
use crate::scope::{ScopeId, ScopeTree};

// ============ Options ============

#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub constant_folding: bool,
    /// Name of the function whose body is being compiled
    pub func: Option<String>,
    pub default_module: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            constant_folding: true,
            func: None,
            default_module: DEFAULT_MODULE.to_string(),
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant_folding(mut self, enabled: bool) -> Self {
        self.constant_folding = enabled;
        self
    }

    pub fn in_function(mut self, name: impl Into<String>) -> Self {
        self.func = Some(name.into());
        self
    }

    pub fn with_default_module(mut self, module: impl Into<String>) -> Self {
        self.default_module = module.into();
        self
    }
}

// ============ Environment ============

/// Monotonic per-hint counters: `expr~1`, `expr~2`, `ns~1`
#[derive(Debug, Clone, Default)]
pub struct AliasGenerator {
    counters: HashMap<String, u32>,
}

impl AliasGenerator {
    pub fn get(&mut self, hint: &str) -> String {
        let counter = self.counters.entry(hint.to_string()).or_insert(0);
        *counter += 1;
        format!("{hint}~{counter}")
    }
}

pub struct Env<'s> {
    pub schema: &'s Schema,
    pub options: CompilerOptions,
    /// Parameter name to the type of its first cast, in first-seen order
    pub query_parameters: IndexMap<String, TypeRef>,
    pub scope_tree: ScopeTree,
    pub deferred: CardinalityQueue,
    pub aliases: AliasGenerator,
    next_set_id: u32,
}

impl<'s> Env<'s> {
    pub fn new(schema: &'s Schema, options: CompilerOptions) -> Self {
        Self {
            schema,
            options,
            query_parameters: IndexMap::new(),
            scope_tree: ScopeTree::new(),
            deferred: CardinalityQueue::default(),
            aliases: AliasGenerator::default(),
            next_set_id: 0,
        }
    }

    pub fn next_set_id(&mut self) -> SetId {
        self.next_set_id += 1;
        SetId(self.next_set_id)
    }
}

// ============ Context levels ============

#[derive(Debug, Clone)]
pub struct ContextLevel {
    pub scope: ScopeId,
    pub func: Option<String>,
    /// Position whose value reaches the query output
    pub expr_exposed: bool,
    pub constant_folding: bool,
    pub path_id_namespace: Option<String>,
}

impl ContextLevel {
    /// Top-level context for a query; its result is exposed
    pub fn root(env: &Env<'_>) -> Self {
        Self {
            scope: env.scope_tree.root(),
            func: env.options.func.clone(),
            expr_exposed: true,
            constant_folding: env.options.constant_folding,
            path_id_namespace: None,
        }
    }

    /// Same scope, independently adjustable flags
    pub fn new_level(&self) -> Self {
        self.clone()
    }

    /// Child frame in the scope tree
    pub fn newscope(&self, env: &mut Env<'_>, fenced: bool) -> Self {
        Self {
            scope: env.scope_tree.add_child(self.scope, fenced),
            ..self.clone()
        }
    }

    /// Fresh scope root and path namespace, uncorrelated with this level
    pub fn detached(&self, env: &mut Env<'_>) -> Self {
        let namespace = match &self.path_id_namespace {
            Some(outer) => format!("{outer}.{}", env.aliases.get("ns")),
            None => env.aliases.get("ns"),
        };
        Self {
            scope: env.scope_tree.add_root(),
            path_id_namespace: Some(namespace),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builder() {
        let options = CompilerOptions::new()
            .with_constant_folding(false)
            .in_function("default::f")
            .with_default_module("app");
        assert!(!options.constant_folding);
        assert_eq!(options.func.as_deref(), Some("default::f"));
        assert_eq!(options.default_module, "app");
    }

    #[test]
    fn aliases_count_per_hint() {
        let mut aliases = AliasGenerator::default();
        assert_eq!(aliases.get("expr"), "expr~1");
        assert_eq!(aliases.get("expr"), "expr~2");
        assert_eq!(aliases.get("ns"), "ns~1");
    }

    #[test]
    fn child_levels_get_new_frames() {
        let schema = Schema::std();
        let mut env = Env::new(&schema, CompilerOptions::default());
        let root = ContextLevel::root(&env);
        let fenced = root.newscope(&mut env, true);
        assert_ne!(fenced.scope, root.scope);
        assert_eq!(env.scope_tree.parent(fenced.scope), Some(root.scope));
        assert!(env.scope_tree.is_fenced(fenced.scope));

        let detached = root.detached(&mut env);
        assert_eq!(env.scope_tree.parent(detached.scope), None);
        assert_eq!(detached.path_id_namespace.as_deref(), Some("ns~1"));
    }
}
