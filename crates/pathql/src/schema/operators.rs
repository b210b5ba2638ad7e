//! Operator catalog
//!
//! Overloads are keyed by qualified name and kind; overload selection lives
//! in the compiler, this module only stores signatures.

use indexmap::IndexMap;
use serde::Serialize;

use super::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperatorKind {
    Infix,
    Prefix,
    /// Reserved for catalog extensions; the standard library has none
    Postfix,
    Ternary,
}

/// How an argument (or the result) relates to set semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeModifier {
    Singleton,
    SetOf,
    Optional,
}

/// How a backend should render the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BackendHint {
    Operator(String),
    Function(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub typemod: TypeModifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    /// Qualified name, e.g. `std::+`
    pub name: String,
    pub kind: OperatorKind,
    pub params: Vec<Param>,
    pub return_type: TypeRef,
    pub return_typemod: TypeModifier,
    pub commutator: Option<String>,
    pub backend: BackendHint,
}

impl Operator {
    pub(super) fn infix(name: &str, left: TypeRef, right: TypeRef, ret: TypeRef) -> Self {
        Self {
            name: format!("std::{name}"),
            kind: OperatorKind::Infix,
            params: vec![param("l", left), param("r", right)],
            return_type: ret,
            return_typemod: TypeModifier::Singleton,
            commutator: None,
            backend: BackendHint::Operator(name.to_string()),
        }
    }

    pub(super) fn prefix(name: &str, operand: TypeRef, ret: TypeRef) -> Self {
        Self {
            name: format!("std::{name}"),
            kind: OperatorKind::Prefix,
            params: vec![param("operand", operand)],
            return_type: ret,
            return_typemod: TypeModifier::Singleton,
            commutator: None,
            backend: BackendHint::Operator(name.to_string()),
        }
    }

    /// Set parameter modifiers in order, then the return modifier
    pub(super) fn with_typemods(mut self, params: &[TypeModifier], ret: TypeModifier) -> Self {
        for (param, typemod) in self.params.iter_mut().zip(params) {
            param.typemod = *typemod;
        }
        self.return_typemod = ret;
        self
    }

    pub(super) fn with_commutator(mut self, name: &str) -> Self {
        self.commutator = Some(format!("std::{name}"));
        self
    }

    pub(super) fn with_backend(mut self, backend: BackendHint) -> Self {
        self.backend = backend;
        self
    }

    /// True if any parameter or the return type is a pseudo type
    pub fn is_polymorphic(&self) -> bool {
        self.params.iter().any(|p| p.ty.is_generic()) || self.return_type.is_generic()
    }
}

fn param(name: &str, ty: TypeRef) -> Param {
    Param {
        name: name.to_string(),
        ty,
        typemod: TypeModifier::Singleton,
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperatorCatalog {
    overloads: IndexMap<(String, OperatorKind), Vec<Operator>>,
}

impl OperatorCatalog {
    pub(super) fn add(&mut self, op: Operator) {
        self.overloads
            .entry((op.name.clone(), op.kind))
            .or_default()
            .push(op);
    }

    /// All overloads registered under a qualified name and kind
    pub fn lookup(&self, name: &str, kind: OperatorKind) -> &[Operator] {
        self.overloads
            .get(&(name.to_string(), kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_keyed_by_kind() {
        let mut catalog = OperatorCatalog::default();
        let int64 = TypeRef::scalar("std::int64");
        catalog.add(Operator::infix("-", int64.clone(), int64.clone(), int64.clone()));
        catalog.add(Operator::prefix("-", int64.clone(), int64));
        assert_eq!(catalog.lookup("std::-", OperatorKind::Infix).len(), 1);
        assert_eq!(catalog.lookup("std::-", OperatorKind::Prefix).len(), 1);
        assert!(catalog.lookup("std::+", OperatorKind::Infix).is_empty());
    }

    #[test]
    fn typemods_apply_in_order() {
        let op = Operator::infix("??", TypeRef::anytype(), TypeRef::anytype(), TypeRef::anytype())
            .with_typemods(
                &[TypeModifier::Optional, TypeModifier::SetOf],
                TypeModifier::SetOf,
            );
        assert_eq!(op.params[0].typemod, TypeModifier::Optional);
        assert_eq!(op.params[1].typemod, TypeModifier::SetOf);
        assert_eq!(op.return_typemod, TypeModifier::SetOf);
        assert!(op.is_polymorphic());
    }
}
