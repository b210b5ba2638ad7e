//! Typed intermediate representation
//!
//! Every compiled sub-expression is a [`Set`]: an IR expression, its static
//! type and the path identity used for scope registration.

use serde::Serialize;
use std::fmt;

use crate::ast::Span;
use crate::cardinality::Cardinality;
use crate::schema::{
    BackendHint, OperatorKind, PointerCardinality, PointerKind, TypeModifier, TypeRef,
};

/// Identity of one compiled set within a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SetId(pub u32);

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Binding key for scope visibility
///
/// Object paths are the chain of steps from their anchor type
/// (`default::User`, `.friends`, `.name`); other expressions get a unique
/// generated step. The namespace separates detached expressions from the
/// enclosing query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PathId {
    pub namespace: Option<String>,
    pub steps: Vec<String>,
}

impl PathId {
    pub fn root(anchor: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            steps: vec![anchor.into()],
        }
    }

    pub fn extend(&self, step: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step.into());
        Self {
            namespace: self.namespace.clone(),
            steps,
        }
    }

    /// Proper prefixes, shortest first
    pub fn prefixes(&self) -> impl Iterator<Item = PathId> + '_ {
        (1..self.steps.len()).map(|len| PathId {
            namespace: self.namespace.clone(),
            steps: self.steps[..len].to_vec(),
        })
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}@")?;
        }
        write!(f, "({})", self.steps.join(""))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Set {
    pub id: SetId,
    pub path_id: PathId,
    pub typeref: TypeRef,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Constant(ConstValue),

    /// `{}`; typed by context
    EmptySet,

    /// `<array<T>>[]`
    EmptyArray,

    Parameter {
        name: String,
    },

    OperatorCall(OperatorCall),

    TypeCast {
        expr: Box<Set>,
        from: TypeRef,
        to: TypeRef,
        /// Inserted by overload resolution rather than written by the user
        implicit: bool,
        /// Object sources should be materialized with their shape
        serialize_shape: bool,
    },

    Tuple {
        named: bool,
        elements: Vec<TupleElement>,
    },

    Array {
        elements: Vec<Set>,
    },

    IfElse {
        condition: Box<Set>,
        if_expr: Box<Set>,
        else_expr: Box<Set>,
        if_expr_card: Option<Cardinality>,
        else_expr_card: Option<Cardinality>,
    },

    /// `IS` check; `result` is known statically for non-object operands
    TypeCheck {
        left: Box<Set>,
        right: TypeRef,
        negated: bool,
        /// Static subtype membership of `left` in `right`, ignoring
        /// `negated`; `None` when decided at run time through `__type__`
        result: Option<bool>,
    },

    IndexIndirection {
        expr: Box<Set>,
        index: Box<Set>,
    },

    SliceIndirection {
        expr: Box<Set>,
        start: Option<Box<Set>>,
        stop: Option<Box<Set>>,
    },

    TypeIntrospection {
        target: TypeRef,
    },

    /// Anchor of an object path: all objects of the set's type
    ObjectRoot,

    PointerStep {
        source: Box<Set>,
        ptr_name: String,
        kind: PointerKind,
        cardinality: PointerCardinality,
        required: bool,
    },

    /// `source[IS Type]`; the target type is the set's type
    TypeIntersection {
        source: Box<Set>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConstValue {
    Str(String),
    Int(i64),
    /// Decimal literal text; may exceed what the evaluator can represent
    Decimal(String),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TupleElement {
    pub name: String,
    pub val: Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallArg {
    pub expr: Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorCall {
    /// Qualified operator name, e.g. `std::+`
    pub func_shortname: String,
    pub operator_kind: OperatorKind,
    pub args: Vec<CallArg>,
    pub typeref: TypeRef,
    pub polymorphic: bool,
    pub params_typemods: Vec<TypeModifier>,
    pub return_typemod: TypeModifier,
    pub backend: BackendHint,
    pub span: Span,
}

impl OperatorCall {
    /// Same operator, different arguments
    pub fn with_args(&self, args: Vec<Set>) -> Self {
        Self {
            args: args.into_iter().map(|expr| CallArg { expr }).collect(),
            ..self.clone()
        }
    }
}

impl Set {
    pub fn is_constant(&self) -> bool {
        matches!(self.expr, Expr::Constant(_))
    }

    pub fn as_operator_call(&self) -> Option<&OperatorCall> {
        match &self.expr {
            Expr::OperatorCall(call) => Some(call),
            _ => None,
        }
    }

    /// Direct sub-sets in evaluation order
    pub fn children(&self) -> Vec<&Set> {
        match &self.expr {
            Expr::Constant(_)
            | Expr::EmptySet
            | Expr::EmptyArray
            | Expr::Parameter { .. }
            | Expr::TypeIntrospection { .. }
            | Expr::ObjectRoot => Vec::new(),
            Expr::OperatorCall(call) => call.args.iter().map(|a| &a.expr).collect(),
            Expr::TypeCast { expr, .. }
            | Expr::TypeCheck { left: expr, .. }
            | Expr::PointerStep { source: expr, .. }
            | Expr::TypeIntersection { source: expr } => vec![&**expr],
            Expr::Tuple { elements, .. } => elements.iter().map(|e| &e.val).collect(),
            Expr::Array { elements } => elements.iter().collect(),
            Expr::IfElse {
                condition,
                if_expr,
                else_expr,
                ..
            } => vec![&**condition, &**if_expr, &**else_expr],
            Expr::IndexIndirection { expr, index } => vec![&**expr, &**index],
            Expr::SliceIndirection { expr, start, stop } => {
                let mut children = vec![&**expr];
                children.extend(start.as_deref());
                children.extend(stop.as_deref());
                children
            }
        }
    }

    fn children_mut(&mut self) -> Vec<&mut Set> {
        match &mut self.expr {
            Expr::Constant(_)
            | Expr::EmptySet
            | Expr::EmptyArray
            | Expr::Parameter { .. }
            | Expr::TypeIntrospection { .. }
            | Expr::ObjectRoot => Vec::new(),
            Expr::OperatorCall(call) => call.args.iter_mut().map(|a| &mut a.expr).collect(),
            Expr::TypeCast { expr, .. }
            | Expr::TypeCheck { left: expr, .. }
            | Expr::PointerStep { source: expr, .. }
            | Expr::TypeIntersection { source: expr } => vec![&mut **expr],
            Expr::Tuple { elements, .. } => elements.iter_mut().map(|e| &mut e.val).collect(),
            Expr::Array { elements } => elements.iter_mut().collect(),
            Expr::IfElse {
                condition,
                if_expr,
                else_expr,
                ..
            } => vec![&mut **condition, &mut **if_expr, &mut **else_expr],
            Expr::IndexIndirection { expr, index } => vec![&mut **expr, &mut **index],
            Expr::SliceIndirection { expr, start, stop } => {
                let mut children = vec![&mut **expr];
                children.extend(start.as_deref_mut());
                children.extend(stop.as_deref_mut());
                children
            }
        }
    }

    /// Depth-first search for a set by id
    pub fn find(&self, id: SetId) -> Option<&Set> {
        if self.id == id {
            return Some(self);
        }
        self.children().into_iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: SetId) -> Option<&mut Set> {
        if self.id == id {
            return Some(self);
        }
        self.children_mut()
            .into_iter()
            .find_map(|child| child.find_mut(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(id: u32, value: i64) -> Set {
        Set {
            id: SetId(id),
            path_id: PathId::root(format!("~{id}"), None),
            typeref: TypeRef::scalar("std::int64"),
            expr: Expr::Constant(ConstValue::Int(value)),
        }
    }

    #[test]
    fn path_prefixes_exclude_self() {
        let path = PathId::root("default::User", None)
            .extend(".friends")
            .extend(".name");
        let prefixes: Vec<_> = path.prefixes().collect();
        assert_eq!(prefixes.len(), 2);
        assert_eq!(prefixes[0].steps, vec!["default::User"]);
        assert_eq!(prefixes[1].to_string(), "(default::User.friends)");
    }

    #[test]
    fn find_mut_reaches_nested_sets() {
        let mut array = Set {
            id: SetId(3),
            path_id: PathId::root("~3", None),
            typeref: TypeRef::array(TypeRef::scalar("std::int64")),
            expr: Expr::Array {
                elements: vec![constant(1, 1), constant(2, 2)],
            },
        };
        let found = array.find_mut(SetId(2)).unwrap();
        found.expr = Expr::Constant(ConstValue::Int(20));
        assert_eq!(
            array.find(SetId(2)).unwrap().expr,
            Expr::Constant(ConstValue::Int(20))
        );
        assert!(array.find(SetId(9)).is_none());
    }
}
