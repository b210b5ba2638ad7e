//! Type catalog
//!
//! Holds scalar and object types, the cast graph and the operator catalog,
//! and answers the subtype, common-supertype and castability questions the
//! compiler asks while typing expressions.

mod operators;
mod stdlib;

pub use operators::{BackendHint, Operator, OperatorCatalog, OperatorKind, Param, TypeModifier};

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::ast::TypeExpr;
use crate::error::SchemaError;
use crate::parse::parse_type;

// ============ Type references ============

/// Resolved reference to a type in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeRef {
    Scalar(String),
    Pseudo(PseudoType),
    Object(String),
    Array(Box<TypeRef>),
    Tuple {
        named: bool,
        elements: Vec<(String, TypeRef)>,
    },
}

/// Abstract types that only appear in signatures and inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PseudoType {
    AnyType,
    AnyScalar,
    AnyReal,
    AnyInt,
    AnyFloat,
}

impl PseudoType {
    pub fn name(self) -> &'static str {
        match self {
            PseudoType::AnyType => "anytype",
            PseudoType::AnyScalar => "std::anyscalar",
            PseudoType::AnyReal => "std::anyreal",
            PseudoType::AnyInt => "std::anyint",
            PseudoType::AnyFloat => "std::anyfloat",
        }
    }

    pub fn parent(self) -> Option<PseudoType> {
        match self {
            PseudoType::AnyType => None,
            PseudoType::AnyScalar => Some(PseudoType::AnyType),
            PseudoType::AnyReal => Some(PseudoType::AnyScalar),
            PseudoType::AnyInt | PseudoType::AnyFloat => Some(PseudoType::AnyReal),
        }
    }

    fn from_name(name: &str) -> Option<PseudoType> {
        match name.strip_prefix("std::").unwrap_or(name) {
            "anytype" => Some(PseudoType::AnyType),
            "anyscalar" => Some(PseudoType::AnyScalar),
            "anyreal" => Some(PseudoType::AnyReal),
            "anyint" => Some(PseudoType::AnyInt),
            "anyfloat" => Some(PseudoType::AnyFloat),
            _ => None,
        }
    }

    /// Number of parent steps from `self` up to `other`, if `other` is an ancestor
    fn steps_to(self, other: PseudoType) -> Option<u32> {
        let mut current = Some(self);
        let mut steps = 0;
        while let Some(p) = current {
            if p == other {
                return Some(steps);
            }
            current = p.parent();
            steps += 1;
        }
        None
    }

    fn ancestors(self) -> impl Iterator<Item = PseudoType> {
        std::iter::successors(Some(self), |p| p.parent())
    }
}

impl TypeRef {
    pub fn scalar(name: impl Into<String>) -> Self {
        TypeRef::Scalar(name.into())
    }

    pub fn object(name: impl Into<String>) -> Self {
        TypeRef::Object(name.into())
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn anytype() -> Self {
        TypeRef::Pseudo(PseudoType::AnyType)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, TypeRef::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, TypeRef::Tuple { .. })
    }

    pub fn is_collection(&self) -> bool {
        self.is_array() || self.is_tuple()
    }

    /// True if the type is or contains a pseudo type
    pub fn is_generic(&self) -> bool {
        match self {
            TypeRef::Pseudo(_) => true,
            TypeRef::Array(element) => element.is_generic(),
            TypeRef::Tuple { elements, .. } => elements.iter().any(|(_, t)| t.is_generic()),
            TypeRef::Scalar(_) | TypeRef::Object(_) => false,
        }
    }

    pub fn contains_object(&self) -> bool {
        match self {
            TypeRef::Object(_) => true,
            TypeRef::Array(element) => element.contains_object(),
            TypeRef::Tuple { elements, .. } => elements.iter().any(|(_, t)| t.contains_object()),
            TypeRef::Scalar(_) | TypeRef::Pseudo(_) => false,
        }
    }

    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(name) | TypeRef::Object(name) => write!(f, "{name}"),
            TypeRef::Pseudo(p) => write!(f, "{}", p.name()),
            TypeRef::Array(element) => write!(f, "array<{element}>"),
            TypeRef::Tuple { named, elements } => {
                write!(f, "tuple<")?;
                for (i, (name, ty)) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if *named {
                        write!(f, "{name}: ")?;
                    }
                    write!(f, "{ty}")?;
                }
                write!(f, ">")
            }
        }
    }
}

// ============ Catalog entries ============

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: String,
    /// Parent scalar for user-defined scalars extending a std one
    pub base: Option<String>,
    pub family: PseudoType,
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub bases: Vec<String>,
    pub pointers: IndexMap<String, Pointer>,
    pub is_view: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pointer {
    pub name: String,
    pub target: TypeRef,
    pub kind: PointerKind,
    pub cardinality: PointerCardinality,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PointerKind {
    Property,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PointerCardinality {
    One,
    Many,
}

// ============ Definitions (builder API) ============

#[derive(Debug, Clone)]
struct PointerDef {
    name: String,
    target: String,
    kind: PointerKind,
    cardinality: PointerCardinality,
    required: bool,
}

/// User object type declaration
///
/// ```ignore
/// let schema = Schema::std().with_object_type(
///     ObjectTypeDef::new("User")
///         .required_property("name", "str")
///         .multi_link("friends", "User"),
/// )?;
/// ```
#[derive(Debug, Clone)]
pub struct ObjectTypeDef {
    name: String,
    bases: Vec<String>,
    pointers: Vec<PointerDef>,
    is_view: bool,
}

impl ObjectTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            pointers: Vec::new(),
            is_view: false,
        }
    }

    pub fn extending(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn property(self, name: &str, target: &str) -> Self {
        self.pointer(name, target, PointerKind::Property, PointerCardinality::One, false)
    }

    pub fn required_property(self, name: &str, target: &str) -> Self {
        self.pointer(name, target, PointerKind::Property, PointerCardinality::One, true)
    }

    pub fn link(self, name: &str, target: &str) -> Self {
        self.pointer(name, target, PointerKind::Link, PointerCardinality::One, false)
    }

    pub fn multi_link(self, name: &str, target: &str) -> Self {
        self.pointer(name, target, PointerKind::Link, PointerCardinality::Many, false)
    }

    /// Declare this type as a view (derived, not a stored type)
    pub fn view(mut self) -> Self {
        self.is_view = true;
        self
    }

    fn pointer(
        mut self,
        name: &str,
        target: &str,
        kind: PointerKind,
        cardinality: PointerCardinality,
        required: bool,
    ) -> Self {
        self.pointers.push(PointerDef {
            name: name.to_string(),
            target: target.to_string(),
            kind,
            cardinality,
            required,
        });
        self
    }
}

/// User scalar declaration extending an existing scalar
#[derive(Debug, Clone)]
pub struct ScalarTypeDef {
    name: String,
    base: String,
}

impl ScalarTypeDef {
    pub fn new(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
        }
    }
}

// ============ Schema ============

pub const DEFAULT_MODULE: &str = "default";

#[derive(Debug, Clone)]
pub struct Schema {
    scalars: IndexMap<String, ScalarType>,
    objects: IndexMap<String, ObjectType>,
    implicit_casts: IndexMap<String, Vec<String>>,
    explicit_casts: HashSet<(String, String)>,
    operators: OperatorCatalog,
}

impl Schema {
    fn empty() -> Self {
        Self {
            scalars: IndexMap::new(),
            objects: IndexMap::new(),
            implicit_casts: IndexMap::new(),
            explicit_casts: HashSet::new(),
            operators: OperatorCatalog::default(),
        }
    }

    /// The standard library: std scalars, base object types, casts and operators
    pub fn std() -> Self {
        stdlib::build()
    }

    pub fn with_scalar_type(mut self, def: ScalarTypeDef) -> Result<Self, SchemaError> {
        let name = qualify(&def.name);
        if self.contains_type(&name) {
            return Err(SchemaError::Duplicate(name));
        }
        let base = match self.parse_type(&def.base, DEFAULT_MODULE)? {
            TypeRef::Scalar(base) => base,
            other => return Err(SchemaError::InvalidTypeExpr(format!(
                "scalar type '{name}' cannot extend '{other}'"
            ))),
        };
        let family = self.scalars[&base].family;
        self.scalars.insert(
            name.clone(),
            ScalarType {
                name,
                base: Some(base),
                family,
            },
        );
        Ok(self)
    }

    pub fn with_object_type(mut self, def: ObjectTypeDef) -> Result<Self, SchemaError> {
        let name = qualify(&def.name);
        if self.contains_type(&name) {
            return Err(SchemaError::Duplicate(name));
        }

        let mut bases = Vec::new();
        for base in &def.bases {
            match self.parse_type(base, DEFAULT_MODULE)? {
                TypeRef::Object(base) => bases.push(base),
                other => return Err(SchemaError::NotAnObjectType(other.to_string())),
            }
        }
        if bases.is_empty() {
            bases.push("std::Object".to_string());
        }

        // Registered before pointers resolve so a type can link to itself
        self.objects.insert(
            name.clone(),
            ObjectType {
                name: name.clone(),
                bases,
                pointers: IndexMap::new(),
                is_view: def.is_view,
            },
        );

        let mut pointers = IndexMap::new();
        for ptr in def.pointers {
            let target = match self.parse_type(&ptr.target, DEFAULT_MODULE) {
                Ok(target) => target,
                Err(e) => {
                    self.objects.shift_remove(&name);
                    return Err(e);
                }
            };
            pointers.insert(
                ptr.name.clone(),
                Pointer {
                    name: ptr.name,
                    target,
                    kind: ptr.kind,
                    cardinality: ptr.cardinality,
                    required: ptr.required,
                },
            );
        }
        if let Some(object) = self.objects.get_mut(&name) {
            object.pointers = pointers;
        }
        Ok(self)
    }

    pub fn operators(&self) -> &OperatorCatalog {
        &self.operators
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.objects.get(name)
    }

    pub fn scalar_type(&self, name: &str) -> Option<&ScalarType> {
        self.scalars.get(name)
    }

    fn contains_type(&self, name: &str) -> bool {
        self.scalars.contains_key(name) || self.objects.contains_key(name)
    }

    // ============ Name resolution ============

    /// Look up a type by name; unqualified names try the default module,
    /// then `std`, then `schema`
    pub fn get_type(&self, module: Option<&str>, name: &str, default_module: &str) -> Option<TypeRef> {
        match module {
            Some(module) => self.lookup(&format!("{module}::{name}")),
            None => [default_module, "std", "schema"]
                .iter()
                .find_map(|module| self.lookup(&format!("{module}::{name}")))
                .or_else(|| PseudoType::from_name(name).map(TypeRef::Pseudo)),
        }
    }

    fn lookup(&self, qualified: &str) -> Option<TypeRef> {
        if self.scalars.contains_key(qualified) {
            Some(TypeRef::Scalar(qualified.to_string()))
        } else if self.objects.contains_key(qualified) {
            Some(TypeRef::Object(qualified.to_string()))
        } else {
            PseudoType::from_name(qualified).map(TypeRef::Pseudo)
        }
    }

    pub fn resolve_type_expr(
        &self,
        texpr: &TypeExpr,
        default_module: &str,
    ) -> Result<TypeRef, SchemaError> {
        let is_std_or_bare = matches!(texpr.module.as_deref(), None | Some("std"));
        match texpr.name.as_str() {
            "array" if is_std_or_bare => {
                if texpr.subtypes.len() != 1 {
                    return Err(SchemaError::InvalidTypeExpr(format!(
                        "unexpected number of subtypes for array: expecting 1, got {}",
                        texpr.subtypes.len()
                    )));
                }
                let element = self.resolve_type_expr(&texpr.subtypes[0], default_module)?;
                Ok(TypeRef::array(element))
            }
            "tuple" if is_std_or_bare => {
                let named_count = texpr
                    .subtypes
                    .iter()
                    .filter(|s| s.element_name.is_some())
                    .count();
                if named_count != 0 && named_count != texpr.subtypes.len() {
                    return Err(SchemaError::InvalidTypeExpr(
                        "mixing named and unnamed tuple declaration is not supported".into(),
                    ));
                }
                let named = named_count > 0;
                let mut elements = Vec::with_capacity(texpr.subtypes.len());
                for (i, sub) in texpr.subtypes.iter().enumerate() {
                    let name = sub.element_name.clone().unwrap_or_else(|| i.to_string());
                    elements.push((name, self.resolve_type_expr(sub, default_module)?));
                }
                Ok(TypeRef::Tuple { named, elements })
            }
            _ => {
                if !texpr.subtypes.is_empty() {
                    return Err(SchemaError::InvalidTypeExpr(format!(
                        "type '{}' does not accept subtypes",
                        texpr.qualified_name()
                    )));
                }
                self.get_type(texpr.module.as_deref(), &texpr.name, default_module)
                    .ok_or_else(|| SchemaError::UnknownType(texpr.qualified_name()))
            }
        }
    }

    /// Parse and resolve a type written as text, e.g. `array<str>`
    pub fn parse_type(&self, text: &str, default_module: &str) -> Result<TypeRef, SchemaError> {
        let texpr = parse_type(text)?;
        self.resolve_type_expr(&texpr, default_module)
    }

    // ============ Pointers ============

    /// Find a pointer on an object type or any of its ancestors
    pub fn get_pointer(&self, object: &str, name: &str) -> Option<&Pointer> {
        self.object_ancestors(object)
            .iter()
            .find_map(|ancestor| self.objects.get(ancestor)?.pointers.get(name))
    }

    pub fn is_view(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Object(name) => self.objects.get(name).is_some_and(|o| o.is_view),
            _ => false,
        }
    }

    // ============ Subtyping ============

    pub fn issubclass(&self, a: &TypeRef, b: &TypeRef) -> bool {
        self.subclass_distance(a, b).is_some()
    }

    /// Number of inheritance steps from `a` up to `b`
    fn subclass_distance(&self, a: &TypeRef, b: &TypeRef) -> Option<u32> {
        if a == b {
            return Some(0);
        }
        match (a, b) {
            (TypeRef::Scalar(x), TypeRef::Scalar(y)) => self
                .scalar_ancestry(x)
                .iter()
                .position(|n| n == y)
                .map(|p| p as u32),
            (TypeRef::Scalar(x), TypeRef::Pseudo(p)) => {
                let scalar = self.scalars.get(x)?;
                let own = self.scalar_ancestry(x).len() as u32;
                scalar.family.steps_to(*p).map(|steps| own + steps)
            }
            (TypeRef::Pseudo(p), TypeRef::Pseudo(q)) => p.steps_to(*q),
            (TypeRef::Object(x), TypeRef::Object(y)) => self
                .object_ancestors(x)
                .iter()
                .position(|n| n == y)
                .map(|p| p as u32),
            (TypeRef::Array(x), TypeRef::Array(y)) => self.subclass_distance(x, y),
            (
                TypeRef::Tuple { elements: xs, .. },
                TypeRef::Tuple {
                    named: ynamed,
                    elements: ys,
                },
            ) => {
                if xs.len() != ys.len() {
                    return None;
                }
                let mut total = 0;
                for ((xn, xt), (yn, yt)) in xs.iter().zip(ys) {
                    if *ynamed && xn != yn {
                        return None;
                    }
                    total += self.subclass_distance(xt, yt)?;
                }
                Some(total)
            }
            (TypeRef::Object(x), TypeRef::Pseudo(PseudoType::AnyType)) => {
                Some(self.object_ancestors(x).len() as u32)
            }
            (_, TypeRef::Pseudo(PseudoType::AnyType)) => Some(5),
            _ => None,
        }
    }

    /// Scalar itself followed by its base chain
    fn scalar_ancestry(&self, name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(name.to_string());
        while let Some(n) = current {
            current = self.scalars.get(&n).and_then(|s| s.base.clone());
            chain.push(n);
        }
        chain
    }

    /// The std scalar a user scalar ultimately extends
    pub fn material_scalar(&self, name: &str) -> String {
        self.scalar_ancestry(name)
            .pop()
            .unwrap_or_else(|| name.to_string())
    }

    /// Object type followed by its ancestors, breadth first
    fn object_ancestors(&self, name: &str) -> Vec<String> {
        let mut seen = Vec::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(n) = queue.pop_front() {
            if seen.contains(&n) {
                continue;
            }
            if let Some(object) = self.objects.get(&n) {
                queue.extend(object.bases.iter().cloned());
            }
            seen.push(n);
        }
        seen
    }

    // ============ Casts ============

    /// Scalars reachable from `name` through base and implicit-cast edges,
    /// with their distance
    fn scalar_cast_reach(&self, name: &str) -> IndexMap<String, u32> {
        let mut reach = IndexMap::new();
        let mut queue = VecDeque::from([(name.to_string(), 0u32)]);
        while let Some((n, dist)) = queue.pop_front() {
            if reach.contains_key(&n) {
                continue;
            }
            if let Some(base) = self.scalars.get(&n).and_then(|s| s.base.clone()) {
                queue.push_back((base, dist + 1));
            }
            if let Some(targets) = self.implicit_casts.get(&n) {
                queue.extend(targets.iter().map(|t| (t.clone(), dist + 1)));
            }
            reach.insert(n, dist);
        }
        reach
    }

    /// Cost of using a value of type `from` where `to` is expected, if allowed
    pub fn cast_distance(&self, from: &TypeRef, to: &TypeRef) -> Option<u32> {
        if let Some(d) = self.subclass_distance(from, to) {
            return Some(d);
        }
        match (from, to) {
            (TypeRef::Scalar(x), TypeRef::Scalar(y)) => self.scalar_cast_reach(x).get(y).copied(),
            (TypeRef::Array(x), TypeRef::Array(y)) => self.cast_distance(x, y),
            (TypeRef::Tuple { elements: xs, .. }, TypeRef::Tuple { elements: ys, .. }) => {
                if xs.len() != ys.len() {
                    return None;
                }
                xs.iter()
                    .zip(ys)
                    .map(|((_, xt), (_, yt))| self.cast_distance(xt, yt))
                    .sum()
            }
            _ => None,
        }
    }

    pub fn implicitly_castable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        self.cast_distance(from, to).is_some()
    }

    pub fn explicitly_castable(&self, from: &TypeRef, to: &TypeRef) -> bool {
        if self.implicitly_castable(from, to) || self.issubclass(to, from) {
            return true;
        }
        if self.is_json(to) {
            return !from.is_generic();
        }
        match (from, to) {
            (TypeRef::Scalar(x), TypeRef::Scalar(y)) => {
                let (x, y) = (self.material_scalar(x), self.material_scalar(y));
                x == y || self.explicit_casts.contains(&(x, y))
            }
            (TypeRef::Scalar(_), TypeRef::Array(_) | TypeRef::Tuple { .. }) => self.is_json(from),
            (TypeRef::Array(x), TypeRef::Array(y)) => self.explicitly_castable(x, y),
            (TypeRef::Tuple { elements: xs, .. }, TypeRef::Tuple { elements: ys, .. }) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys)
                        .all(|((_, xt), (_, yt))| self.explicitly_castable(xt, yt))
            }
            _ => false,
        }
    }

    pub fn is_json(&self, ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::Scalar(name) if self.material_scalar(name) == "std::json")
    }

    /// Common type both operands implicitly cast to, if any
    pub fn common_supertype(&self, a: &TypeRef, b: &TypeRef) -> Option<TypeRef> {
        if self.issubclass(a, b) {
            return Some(b.clone());
        }
        if self.issubclass(b, a) {
            return Some(a.clone());
        }
        match (a, b) {
            (TypeRef::Scalar(x), TypeRef::Scalar(y)) => {
                let from_y = self.scalar_cast_reach(y);
                self.scalar_cast_reach(x)
                    .iter()
                    .filter_map(|(n, dx)| from_y.get(n).map(|dy| (dx + dy, n)))
                    .min_by_key(|(d, _)| *d)
                    .map(|(_, n)| TypeRef::Scalar(n.clone()))
            }
            (TypeRef::Pseudo(p), other) | (other, TypeRef::Pseudo(p)) => p
                .ancestors()
                .map(TypeRef::Pseudo)
                .find(|candidate| self.issubclass(other, candidate)),
            (TypeRef::Object(x), TypeRef::Object(y)) => {
                let ys = self.object_ancestors(y);
                self.object_ancestors(x)
                    .into_iter()
                    .find(|n| ys.contains(n))
                    .map(TypeRef::Object)
            }
            (TypeRef::Array(x), TypeRef::Array(y)) => {
                self.common_supertype(x, y).map(TypeRef::array)
            }
            (
                TypeRef::Tuple {
                    named: xnamed,
                    elements: xs,
                },
                TypeRef::Tuple {
                    named: ynamed,
                    elements: ys,
                },
            ) => {
                if xs.len() != ys.len() {
                    return None;
                }
                let same_names = xs.iter().zip(ys).all(|((xn, _), (yn, _))| xn == yn);
                let mut elements = Vec::with_capacity(xs.len());
                for ((name, xt), (_, yt)) in xs.iter().zip(ys) {
                    elements.push((name.clone(), self.common_supertype(xt, yt)?));
                }
                Some(TypeRef::Tuple {
                    named: *xnamed && *ynamed && same_names,
                    elements,
                })
            }
            _ => None,
        }
    }

    // ============ Construction helpers (stdlib) ============

    fn add_scalar(&mut self, name: &str, family: PseudoType) {
        self.scalars.insert(
            name.to_string(),
            ScalarType {
                name: name.to_string(),
                base: None,
                family,
            },
        );
    }

    fn add_implicit_cast(&mut self, from: &str, to: &str) {
        self.implicit_casts
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
    }

    fn add_explicit_cast(&mut self, from: &str, to: &str) {
        self.explicit_casts
            .insert((from.to_string(), to.to_string()));
    }

    fn add_object(&mut self, object: ObjectType) {
        self.objects.insert(object.name.clone(), object);
    }
}

/// Unqualified user type names live in the default module
fn qualify(name: &str) -> String {
    if name.contains("::") {
        name.to_string()
    } else {
        format!("{DEFAULT_MODULE}::{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(name: &str) -> TypeRef {
        TypeRef::scalar(name)
    }

    fn test_schema() -> Schema {
        Schema::std()
            .with_object_type(ObjectTypeDef::new("Named").required_property("name", "str"))
            .and_then(|schema| {
                schema.with_object_type(
                    ObjectTypeDef::new("User")
                        .extending("Named")
                        .multi_link("friends", "User"),
                )
            })
            .and_then(|schema| {
                schema.with_object_type(ObjectTypeDef::new("Issue").extending("Named"))
            })
            .unwrap()
    }

    #[test]
    fn scalars_are_subclasses_of_their_family() {
        let schema = Schema::std();
        let anyreal = TypeRef::Pseudo(PseudoType::AnyReal);
        assert!(schema.issubclass(&s("std::int64"), &anyreal));
        assert!(schema.issubclass(&s("std::decimal"), &anyreal));
        assert!(!schema.issubclass(&s("std::str"), &anyreal));
        assert!(schema.issubclass(&s("std::str"), &TypeRef::anytype()));
    }

    #[test]
    fn common_supertype_of_numbers() {
        let schema = Schema::std();
        assert_eq!(
            schema.common_supertype(&s("std::int64"), &s("std::float64")),
            Some(s("std::float64"))
        );
        assert_eq!(
            schema.common_supertype(&s("std::int16"), &s("std::int64")),
            Some(s("std::int64"))
        );
        assert_eq!(
            schema.common_supertype(&s("std::int64"), &s("std::decimal")),
            Some(s("std::decimal"))
        );
        assert_eq!(schema.common_supertype(&s("std::str"), &s("std::bool")), None);
        assert_eq!(
            schema.common_supertype(&s("std::decimal"), &s("std::float64")),
            None
        );
    }

    #[test]
    fn common_supertype_of_objects_is_nearest_ancestor() {
        let schema = test_schema();
        assert_eq!(
            schema.common_supertype(
                &TypeRef::object("default::User"),
                &TypeRef::object("default::Issue")
            ),
            Some(TypeRef::object("default::Named"))
        );
    }

    #[test]
    fn pointers_are_inherited() {
        let schema = test_schema();
        let name = schema.get_pointer("default::User", "name").unwrap();
        assert_eq!(name.target, s("std::str"));
        assert!(name.required);
        let type_ptr = schema.get_pointer("default::User", "__type__").unwrap();
        assert_eq!(type_ptr.target, TypeRef::object("schema::ObjectType"));
    }

    #[test]
    fn explicit_casts() {
        let schema = Schema::std();
        assert!(schema.explicitly_castable(&s("std::int64"), &s("std::str")));
        assert!(schema.explicitly_castable(&s("std::str"), &s("std::float64")));
        assert!(schema.explicitly_castable(&s("std::int64"), &s("std::float64")));
        assert!(!schema.explicitly_castable(&s("std::bytes"), &s("std::int64")));
        assert!(schema.explicitly_castable(
            &TypeRef::array(s("std::int64")),
            &TypeRef::array(s("std::str"))
        ));
        assert!(schema.explicitly_castable(&TypeRef::array(s("std::int64")), &s("std::json")));
    }

    #[test]
    fn resolve_collection_type_exprs() {
        let schema = Schema::std();
        assert_eq!(
            schema.parse_type("array<int64>", DEFAULT_MODULE).unwrap(),
            TypeRef::array(s("std::int64"))
        );
        assert_eq!(
            schema.parse_type("tuple<a: str, b: bool>", DEFAULT_MODULE).unwrap(),
            TypeRef::Tuple {
                named: true,
                elements: vec![("a".into(), s("std::str")), ("b".into(), s("std::bool"))],
            }
        );
        assert_eq!(
            schema.parse_type("anyreal", DEFAULT_MODULE).unwrap(),
            TypeRef::Pseudo(PseudoType::AnyReal)
        );
        assert!(matches!(
            schema.parse_type("Nope", DEFAULT_MODULE),
            Err(SchemaError::UnknownType(_))
        ));
    }

    #[test]
    fn user_scalars_inherit_casts() {
        let schema = Schema::std()
            .with_scalar_type(ScalarTypeDef::new("Age", "int64"))
            .unwrap();
        let age = s("default::Age");
        assert!(schema.issubclass(&age, &s("std::int64")));
        assert!(schema.issubclass(&age, &TypeRef::Pseudo(PseudoType::AnyInt)));
        assert!(schema.implicitly_castable(&age, &s("std::float64")));
        assert!(schema.explicitly_castable(&age, &s("std::str")));
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let err = test_schema()
            .with_object_type(ObjectTypeDef::new("User"))
            .unwrap_err();
        assert_eq!(err, SchemaError::Duplicate("default::User".into()));
    }
}
