use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use filter_dispatcher::query::{MemoryQuery, QuerySource};
use filter_dispatcher::sql_compiler::{SqlBackend, SqlCompiler};
use filter_dispatcher::{impl_reflect, impl_reflect_enum, wire, FilterCompiler, FilterConfig};
use std::collections::HashMap;
use std::hint::black_box;

#[derive(Clone, Copy)]
enum State {
    Open,
    Pending,
    Closed,
}

impl_reflect_enum!(State { Open, Pending, Closed });

struct Run {
    name: String,
    passed: bool,
}

impl_reflect!(Run {
    property "Name" => name: String,
    property "Passed" => passed: bool,
});

struct Test {
    title: String,
    state: State,
    priority: i32,
    runs: Vec<Run>,
}

impl_reflect!(Test {
    property "Title" => title: String,
    property "State" => state: State,
    property "Priority" => priority: i32,
    property "Runs" => runs: Vec<Run>,
});

const CASES: [(&str, &str); 3] = [
    ("simple", r#"{"kind":"Condition","path":"State","operator":"Equals","value":"Open"}"#),
    (
        "medium",
        r#"{"kind":"Group","combinator":"And","children":[
            {"kind":"Condition","path":"State","operator":"In","value":"[\"Open\",\"Pending\"]"},
            {"kind":"Condition","path":"Priority","operator":"GreaterThan","value":"2"},
            {"kind":"Condition","path":"Title","operator":"Contains","value":"release","ignoreCase":true}]}"#,
    ),
    (
        "complex",
        r#"{"kind":"Group","combinator":"Or","children":[
            {"kind":"Group","combinator":"And","children":[
                {"kind":"Condition","path":"State","operator":"NotEquals","value":"Closed"},
                {"kind":"CollectionCondition","path":"Runs","operator":"Any","predicate":
                    {"kind":"Condition","path":"Passed","operator":"Equals","value":"false"}}]},
            {"kind":"CollectionCondition","path":"Runs","operator":"All","predicate":
                {"kind":"Condition","path":"Name","operator":"StartsWith","value":"nightly"}},
            {"kind":"Condition","path":"Missing","operator":"Equals","value":"x"}]}"#,
    ),
];

fn dataset(size: usize) -> Vec<Test> {
    (0..size)
        .map(|i| Test {
            title: format!("Release Plan {}", i),
            state: match i % 3 {
                0 => State::Open,
                1 => State::Pending,
                _ => State::Closed,
            },
            priority: (i % 5) as i32,
            runs: (0..i % 4)
                .map(|r| Run { name: format!("nightly-{}", r), passed: (i + r) % 2 == 0 })
                .collect(),
        })
        .collect()
}

// 基准测试：线格式解码性能
fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_performance");
    for (name, json) in CASES {
        group.bench_with_input(BenchmarkId::new("from_json", name), &json, |b, &json| {
            b.iter(|| black_box(wire::from_json(black_box(json))))
        });
    }
    group.finish();
}

// 基准测试：编译性能 (解析缓存预热后)
fn benchmark_compile(c: &mut Criterion) {
    let compiler = FilterCompiler::new();
    let mut group = c.benchmark_group("compile_performance");
    for (name, json) in CASES {
        let node = match wire::from_json(json) {
            Ok(node) => node,
            Err(e) => panic!("解码失败: {}", e),
        };
        group.bench_with_input(BenchmarkId::new("predicate", name), &node, |b, node| {
            b.iter(|| black_box(compiler.compile::<Test>(black_box(node))))
        });
        group.bench_with_input(BenchmarkId::new("query", name), &node, |b, node| {
            b.iter(|| black_box(compiler.compile_query::<Test>(black_box(node))))
        });
    }
    group.finish();
}

// 基准测试：在内存数据上求值
fn benchmark_evaluate(c: &mut Criterion) {
    let tests = dataset(1_000);
    let mut group = c.benchmark_group("evaluate_performance");
    for (name, json) in CASES {
        let Ok(node) = wire::from_json(json) else { continue };
        let predicate = filter_dispatcher::compile::<Test>(&node);
        let filter = filter_dispatcher::compile_query::<Test>(&node);

        group.bench_function(BenchmarkId::new("eager", name), |b| {
            b.iter(|| black_box(predicate.filter(&tests).count()))
        });
        group.bench_function(BenchmarkId::new("deferred", name), |b| {
            b.iter(|| black_box(MemoryQuery::new(&tests).apply(&filter).count()))
        });
    }
    group.finish();
}

// 基准测试：SQL 生成性能
fn benchmark_sql(c: &mut Criterion) {
    let mut config = FilterConfig::default();
    let mut tables = HashMap::new();
    tables.insert("Test".to_string(), "tests".to_string());
    config.tables = tables;
    config.max_in_values = 2;
    let compiler = SqlCompiler::from_config(config);

    let mut group = c.benchmark_group("sql_compiler_performance");
    for (name, json) in CASES {
        let Ok(node) = wire::from_json(json) else { continue };
        let filter = filter_dispatcher::compile_query::<Test>(&node);
        group.bench_function(BenchmarkId::new("postgres", name), |b| {
            b.iter(|| black_box(compiler.compile(&filter, SqlBackend::Postgres)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_decode,
    benchmark_compile,
    benchmark_evaluate,
    benchmark_sql
);
criterion_main!(benches);
