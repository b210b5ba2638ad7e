use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pathql::ast::{BinOp, Expr};
use pathql::{CompilerOptions, ObjectTypeDef, Schema, compile, parse_type};

fn bench_schema() -> Schema {
    Schema::std()
        .with_object_type(
            ObjectTypeDef::new("User")
                .required_property("name", "str")
                .multi_link("friends", "User"),
        )
        .unwrap()
}

/// `1 + 2 + ... + n`, left-nested
fn long_sum(n: i64) -> Expr {
    (2..=n).fold(Expr::int(1), |acc, i| acc.binop(BinOp::Add, Expr::int(i)))
}

fn bench_constant_folding(c: &mut Criterion) {
    let schema = bench_schema();
    let expr = long_sum(200);

    c.bench_function("fold_long_sum", |b| {
        b.iter(|| compile(black_box(&expr), &schema, CompilerOptions::new()).unwrap())
    });
}

fn bench_set_literal(c: &mut Criterion) {
    let schema = bench_schema();
    let expr = Expr::set((0..200).map(Expr::int).collect());

    c.bench_function("compile_set_literal", |b| {
        b.iter(|| compile(black_box(&expr), &schema, CompilerOptions::new()).unwrap())
    });
}

fn bench_paths_and_params(c: &mut Criterion) {
    let schema = bench_schema();
    let name = Expr::path(&["User", "friends", "name"]);
    let expr = Expr::if_else(
        Expr::cast(parse_type("bool").unwrap(), Expr::param("flag")),
        name.binop(BinOp::Concat, Expr::cast(parse_type("str").unwrap(), Expr::param("suffix"))),
        Expr::str("none"),
    );

    c.bench_function("compile_path_if_else", |b| {
        b.iter(|| compile(black_box(&expr), &schema, CompilerOptions::new()).unwrap())
    });
}

criterion_group!(
    benches,
    bench_constant_folding,
    bench_set_literal,
    bench_paths_and_params
);
criterion_main!(benches);
