use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dsql::{compile, Backend, DefaultTranslator, Lexer, Parser, SeaQueryTranslator};
use std::collections::HashMap;
use std::hint::black_box;

const CASES: &[(&str, &str)] = &[
    ("simple", "SELECT name FROM Account"),
    ("medium", "SELECT name, age FROM Account WHERE age >= 18 AND status = 'Open' LIMIT 10"),
    (
        "complex",
        "SELECT name, 'Billing City', age FROM Account WHERE (age < 18 OR grade > 0) AND NOT name LIKE 'A%' \
         AND created >= 2024-01-31 AND owner = #[flowVars.owner] ORDER BY name, age DESC LIMIT 10 OFFSET 20",
    ),
];

// 创建一个翻译器实例并设置表映射
fn create_translator() -> SeaQueryTranslator {
    let mut translator = SeaQueryTranslator::new(Backend::Postgres);
    let mut table_mapping = HashMap::new();
    table_mapping.insert("Account".to_string(), "accounts".to_string());
    translator.set_table_mapping(table_mapping);
    translator
}

// 基准测试：词法分析性能
fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, dsql) in CASES {
        group.bench_with_input(BenchmarkId::new("tokenize", name), dsql, |b, &dsql| {
            b.iter(|| {
                let tokens: Vec<_> = Lexer::new(black_box(dsql)).collect();
                black_box(tokens)
            })
        });
    }

    group.finish();
}

// 基准测试：构建 token 树
fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_performance");

    for (name, dsql) in CASES {
        // 预先词法分析
        let tokens: Vec<_> = Lexer::new(dsql).collect();

        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| black_box(Parser::new(black_box(tokens)).parse()))
        });
    }

    group.finish();
}

// 基准测试：token 树到查询模型
fn benchmark_compiler(c: &mut Criterion) {
    let mut group = c.benchmark_group("compiler_performance");

    for (name, dsql) in CASES {
        let tree = dsql::parse_tree(dsql);

        group.bench_with_input(BenchmarkId::new("compile", name), &tree, |b, tree| {
            b.iter(|| compile(black_box(tree)).expect("编译应该成功"))
        });
    }

    group.finish();
}

// 基准测试：两种翻译器
fn benchmark_translators(c: &mut Criterion) {
    let mut group = c.benchmark_group("translator_performance");

    for (name, dsql) in CASES {
        let query = dsql::parse(dsql).expect("解析应该成功");

        group.bench_with_input(BenchmarkId::new("default", name), &query, |b, query| {
            b.iter(|| {
                let mut translator = DefaultTranslator::new();
                black_box(query.translate(&mut translator).expect("翻译应该成功"))
            })
        });

        group.bench_with_input(BenchmarkId::new("sea_query", name), &query, |b, query| {
            b.iter(|| {
                let mut translator = create_translator();
                black_box(query.translate(&mut translator).expect("翻译应该成功"))
            })
        });
    }

    group.finish();
}

// 基准测试：完整的端到端处理
fn benchmark_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end_performance");

    for (name, dsql) in CASES {
        group.bench_with_input(BenchmarkId::new("full_pipeline", name), dsql, |b, &dsql| {
            b.iter(|| {
                let query = dsql::parse(black_box(dsql)).expect("解析应该成功");
                let sql = query.translate(&mut create_translator()).expect("翻译应该成功");
                black_box(sql)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_compiler,
    benchmark_translators,
    benchmark_end_to_end
);
criterion_main!(benches);
