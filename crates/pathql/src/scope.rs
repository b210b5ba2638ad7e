//! Scope tree
//!
//! Frames are stored in an arena and addressed by [`ScopeId`]. A fenced frame
//! hides its bindings from everything outside it; an unfenced frame is
//! transparent to its parent.

use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::error::{CompileError, Result};
use crate::ir::{PathId, Set, SetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Default)]
struct ScopeNode {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    fenced: bool,
    paths: IndexSet<PathId>,
    optional: HashSet<PathId>,
}

#[derive(Debug, Clone)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
    /// Each set is attached to exactly one frame
    registered: HashMap<SetId, ScopeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![ScopeNode {
                fenced: true,
                ..ScopeNode::default()
            }],
            registered: HashMap::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn add_child(&mut self, parent: ScopeId, fenced: bool) -> ScopeId {
        let id = ScopeId(self.nodes.len());
        self.nodes.push(ScopeNode {
            parent: Some(parent),
            fenced,
            ..ScopeNode::default()
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// A parentless frame; nothing outside it is visible from inside
    pub fn add_root(&mut self) -> ScopeId {
        let id = ScopeId(self.nodes.len());
        self.nodes.push(ScopeNode {
            fenced: true,
            ..ScopeNode::default()
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.nodes[scope.0].parent
    }

    pub fn is_fenced(&self, scope: ScopeId) -> bool {
        self.nodes[scope.0].fenced
    }

    pub fn paths(&self, scope: ScopeId) -> impl Iterator<Item = &PathId> {
        self.nodes[scope.0].paths.iter()
    }

    pub fn scope_of(&self, set: SetId) -> Option<ScopeId> {
        self.registered.get(&set).copied()
    }

    /// Bind a set's path (and its prefixes) in `scope`
    ///
    /// Registering the same set twice in one frame is a no-op; moving it to
    /// a different frame is a compiler bug.
    pub fn register(&mut self, set: &Set, scope: ScopeId) -> Result<()> {
        if let Some(existing) = self.registered.get(&set.id) {
            if *existing == scope {
                return Ok(());
            }
            return Err(CompileError::internal(format!(
                "set {} is already registered in scope {:?}, cannot attach to {:?}",
                set.id, existing, scope
            )));
        }
        log::trace!("register {} {} in {:?}", set.id, set.path_id, scope);
        self.registered.insert(set.id, scope);
        let node = &mut self.nodes[scope.0];
        node.paths.extend(set.path_id.prefixes());
        node.paths.insert(set.path_id.clone());
        Ok(())
    }

    pub fn mark_optional(&mut self, path_id: &PathId, scope: ScopeId) {
        self.nodes[scope.0].optional.insert(path_id.clone());
    }

    /// Optional in `scope` or any enclosing frame
    pub fn is_optional(&self, path_id: &PathId, scope: ScopeId) -> bool {
        self.ancestors(scope)
            .any(|s| self.nodes[s.0].optional.contains(path_id))
    }

    /// A path is visible from `scope` if it is bound in an enclosing frame
    /// or in an unfenced descendant of one
    pub fn is_visible(&self, path_id: &PathId, scope: ScopeId) -> bool {
        self.ancestors(scope)
            .any(|s| self.binds_transparently(s, path_id))
    }

    fn binds_transparently(&self, scope: ScopeId, path_id: &PathId) -> bool {
        let node = &self.nodes[scope.0];
        node.paths.contains(path_id)
            || node.children.iter().any(|child| {
                !self.nodes[child.0].fenced && self.binds_transparently(*child, path_id)
            })
    }

    fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), |s| self.nodes[s.0].parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ConstValue, Expr};
    use crate::schema::TypeRef;

    fn set(id: u32, path: PathId) -> Set {
        Set {
            id: SetId(id),
            path_id: path,
            typeref: TypeRef::scalar("std::int64"),
            expr: Expr::Constant(ConstValue::Int(1)),
        }
    }

    fn user_name() -> PathId {
        PathId::root("default::User", None).extend(".name")
    }

    #[test]
    fn fenced_bindings_do_not_leak() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let branch = tree.add_child(root, true);
        let sibling = tree.add_child(root, true);
        tree.register(&set(1, user_name()), branch).unwrap();

        assert!(tree.is_visible(&user_name(), branch));
        assert!(!tree.is_visible(&user_name(), sibling));
        assert!(!tree.is_visible(&user_name(), root));
    }

    #[test]
    fn unfenced_bindings_are_transparent() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let inner = tree.add_child(root, false);
        let fenced = tree.add_child(root, true);
        tree.register(&set(1, user_name()), inner).unwrap();

        assert!(tree.is_visible(&user_name(), root));
        assert!(tree.is_visible(&user_name(), fenced));
    }

    #[test]
    fn prefixes_are_bound_with_the_path() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.register(&set(1, user_name()), root).unwrap();
        assert!(tree.is_visible(&PathId::root("default::User", None), root));
    }

    #[test]
    fn registration_is_write_once() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let child = tree.add_child(root, true);
        let s = set(1, user_name());
        tree.register(&s, root).unwrap();
        tree.register(&s, root).unwrap();
        let err = tree.register(&s, child).unwrap_err();
        assert!(err.is_internal());
        assert_eq!(tree.scope_of(SetId(1)), Some(root));
    }

    #[test]
    fn detached_roots_see_nothing_outside() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.register(&set(1, user_name()), root).unwrap();
        let detached = tree.add_root();
        assert!(!tree.is_visible(&user_name(), detached));
        assert_eq!(tree.parent(detached), None);
    }

    #[test]
    fn optional_marks_are_inherited_by_children() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let child = tree.add_child(root, false);
        tree.mark_optional(&user_name(), root);
        assert!(tree.is_optional(&user_name(), child));
        assert!(!tree.is_optional(&PathId::root("default::User", None), child));
    }
}
