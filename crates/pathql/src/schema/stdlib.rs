//! Standard library catalog: std scalars, base object types, casts and operators

use indexmap::IndexMap;

use super::operators::{BackendHint, Operator, OperatorCatalog, TypeModifier};
use super::{
    ObjectType, Pointer, PointerCardinality, PointerKind, PseudoType, Schema, TypeRef,
};

const INTS: [&str; 3] = ["std::int16", "std::int32", "std::int64"];
const FLOATS: [&str; 2] = ["std::float32", "std::float64"];
const NUMERIC: [&str; 6] = [
    "std::int16",
    "std::int32",
    "std::int64",
    "std::float32",
    "std::float64",
    "std::decimal",
];
const OTHER_SCALARS: [&str; 6] = [
    "std::str",
    "std::bool",
    "std::bytes",
    "std::uuid",
    "std::json",
    "std::datetime",
];

pub(super) fn build() -> Schema {
    let mut schema = Schema::empty();

    for name in INTS {
        schema.add_scalar(name, PseudoType::AnyInt);
    }
    for name in FLOATS {
        schema.add_scalar(name, PseudoType::AnyFloat);
    }
    schema.add_scalar("std::decimal", PseudoType::AnyReal);
    for name in OTHER_SCALARS {
        schema.add_scalar(name, PseudoType::AnyScalar);
    }

    for (from, to) in [
        ("std::int16", "std::int32"),
        ("std::int16", "std::float32"),
        ("std::int32", "std::int64"),
        ("std::int32", "std::float64"),
        ("std::int64", "std::float64"),
        ("std::int64", "std::decimal"),
        ("std::float32", "std::float64"),
    ] {
        schema.add_implicit_cast(from, to);
    }

    for from in NUMERIC {
        for to in NUMERIC {
            if from != to {
                schema.add_explicit_cast(from, to);
            }
        }
    }
    for name in NUMERIC.iter().chain(&OTHER_SCALARS) {
        if *name != "std::str" && *name != "std::bytes" {
            schema.add_explicit_cast(name, "std::str");
            schema.add_explicit_cast("std::str", name);
        }
        if *name != "std::json" {
            schema.add_explicit_cast("std::json", name);
        }
    }
    for int in INTS {
        schema.add_explicit_cast("std::bool", int);
        schema.add_explicit_cast(int, "std::bool");
    }

    add_base_objects(&mut schema);
    add_operators(&mut schema.operators);
    schema
}

fn add_base_objects(schema: &mut Schema) {
    let mut base_pointers = IndexMap::new();
    base_pointers.insert(
        "id".to_string(),
        Pointer {
            name: "id".to_string(),
            target: TypeRef::scalar("std::uuid"),
            kind: PointerKind::Property,
            cardinality: PointerCardinality::One,
            required: true,
        },
    );
    base_pointers.insert(
        "__type__".to_string(),
        Pointer {
            name: "__type__".to_string(),
            target: TypeRef::object("schema::ObjectType"),
            kind: PointerKind::Link,
            cardinality: PointerCardinality::One,
            required: true,
        },
    );
    schema.add_object(ObjectType {
        name: "std::BaseObject".to_string(),
        bases: Vec::new(),
        pointers: base_pointers,
        is_view: false,
    });
    schema.add_object(object("std::Object", "std::BaseObject"));

    let mut type_pointers = IndexMap::new();
    type_pointers.insert(
        "name".to_string(),
        Pointer {
            name: "name".to_string(),
            target: TypeRef::scalar("std::str"),
            kind: PointerKind::Property,
            cardinality: PointerCardinality::One,
            required: true,
        },
    );
    schema.add_object(ObjectType {
        name: "schema::Type".to_string(),
        bases: vec!["std::BaseObject".to_string()],
        pointers: type_pointers,
        is_view: false,
    });
    schema.add_object(object("schema::ObjectType", "schema::Type"));
    schema.add_object(object("schema::ScalarType", "schema::Type"));
    schema.add_object(object("schema::Array", "schema::Type"));
    schema.add_object(object("schema::Tuple", "schema::Type"));
}

fn object(name: &str, base: &str) -> ObjectType {
    ObjectType {
        name: name.to_string(),
        bases: vec![base.to_string()],
        pointers: IndexMap::new(),
        is_view: false,
    }
}

fn add_operators(catalog: &mut OperatorCatalog) {
    use TypeModifier::{Optional, SetOf, Singleton};

    let t = TypeRef::scalar;
    let any = TypeRef::anytype;
    let bool_t = || t("std::bool");

    for name in NUMERIC {
        let ty = t(name);
        let is_int = INTS.contains(&name);
        let quotient = if is_int { t("std::float64") } else { ty.clone() };

        catalog.add(Operator::infix("+", ty.clone(), ty.clone(), ty.clone()).with_commutator("+"));
        catalog.add(Operator::infix("-", ty.clone(), ty.clone(), ty.clone()));
        catalog.add(Operator::infix("*", ty.clone(), ty.clone(), ty.clone()).with_commutator("*"));
        catalog.add(Operator::infix("/", ty.clone(), ty.clone(), quotient.clone()));
        catalog.add(
            Operator::infix("//", ty.clone(), ty.clone(), ty.clone())
                .with_backend(BackendHint::Function("floor_div".into())),
        );
        catalog.add(
            Operator::infix("%", ty.clone(), ty.clone(), ty.clone())
                .with_backend(BackendHint::Function("floor_mod".into())),
        );
        catalog.add(Operator::infix("^", ty.clone(), ty.clone(), quotient));
        catalog.add(Operator::prefix("-", ty.clone(), ty.clone()));
        catalog.add(Operator::prefix("+", ty.clone(), ty));
    }

    // Legacy string concatenation through `+`
    catalog.add(
        Operator::infix("+", t("std::str"), t("std::str"), t("std::str"))
            .with_backend(BackendHint::Operator("||".into())),
    );
    for name in ["std::str", "std::bytes"] {
        catalog.add(
            Operator::infix("++", t(name), t(name), t(name))
                .with_backend(BackendHint::Operator("||".into())),
        );
    }

    for (name, commutator) in [
        ("=", "="),
        ("!=", "!="),
        ("<", ">"),
        ("<=", ">="),
        (">", "<"),
        (">=", "<="),
    ] {
        catalog.add(Operator::infix(name, any(), any(), bool_t()).with_commutator(commutator));
    }

    catalog.add(Operator::infix("AND", bool_t(), bool_t(), bool_t()).with_commutator("AND"));
    catalog.add(Operator::infix("OR", bool_t(), bool_t(), bool_t()).with_commutator("OR"));
    catalog.add(Operator::prefix("NOT", bool_t(), bool_t()));

    catalog.add(Operator::infix("LIKE", t("std::str"), t("std::str"), bool_t()));
    catalog.add(Operator::infix("ILIKE", t("std::str"), t("std::str"), bool_t()));

    for name in ["IN", "NOT IN"] {
        catalog.add(
            Operator::infix(name, any(), any(), bool_t()).with_typemods(&[Singleton, SetOf], Singleton),
        );
    }
    catalog.add(
        Operator::infix("UNION", any(), any(), any()).with_typemods(&[SetOf, SetOf], SetOf),
    );
    catalog.add(
        Operator::infix("??", any(), any(), any())
            .with_typemods(&[Optional, SetOf], SetOf)
            .with_backend(BackendHint::Function("coalesce".into())),
    );
    catalog.add(
        Operator::prefix("EXISTS", any(), bool_t())
            .with_typemods(&[SetOf], Singleton),
    );
    catalog.add(
        Operator::prefix("DISTINCT", any(), any())
            .with_typemods(&[SetOf], SetOf),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OperatorKind;

    #[test]
    fn plus_has_numeric_and_string_overloads() {
        let schema = build();
        let overloads = schema.operators().lookup("std::+", OperatorKind::Infix);
        assert_eq!(overloads.len(), NUMERIC.len() + 1);
        assert!(overloads
            .iter()
            .any(|op| op.return_type == TypeRef::scalar("std::str")));
    }

    #[test]
    fn integer_division_returns_float() {
        let schema = build();
        let div = schema
            .operators()
            .lookup("std::/", OperatorKind::Infix)
            .iter()
            .find(|op| op.params[0].ty == TypeRef::scalar("std::int64"))
            .unwrap();
        assert_eq!(div.return_type, TypeRef::scalar("std::float64"));
    }

    #[test]
    fn base_object_carries_type_link() {
        let schema = build();
        let ptr = schema.get_pointer("std::Object", "__type__").unwrap();
        assert_eq!(ptr.kind, PointerKind::Link);
        assert!(schema.issubclass(
            &TypeRef::object("schema::ObjectType"),
            &TypeRef::object("schema::Type")
        ));
    }
}
