use criterion::{criterion_group, criterion_main, Criterion};

use ogeditor::{defaults, preview, Diagnostics, TemplateCompiler};

fn bench_compile(c: &mut Criterion) {
    let compiler = TemplateCompiler::new(Diagnostics::new());
    let params: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(r#"{"title": "Benchmark run"}"#).unwrap();

    c.bench_function("compile_example_template", |b| {
        b.iter(|| compiler.compile(defaults::HTML_EXAMPLE, &params))
    });

    // The fallback path parses and fails on every call.
    let broken = "<h1>{{#if}}</h1>";
    c.bench_function("compile_fallback_on_broken_template", |b| {
        b.iter(|| compiler.compile(broken, &params))
    });
}

fn bench_document_assembly(c: &mut Criterion) {
    let compiler = TemplateCompiler::new(Diagnostics::new());
    let params: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(r#"{"title": "Benchmark run"}"#).unwrap();
    let compiled = compiler.compile(defaults::HTML_EXAMPLE, &params);

    c.bench_function("assemble_preview_document", |b| {
        b.iter(|| preview::preview_document(&compiled, defaults::CSS_EXAMPLE))
    });

    let document = preview::preview_document(&compiled, defaults::CSS_EXAMPLE);
    c.bench_function("text_snapshot", |b| {
        b.iter(|| preview::text_snapshot(&document))
    });
}

criterion_group!(benches, bench_compile, bench_document_assembly);
criterion_main!(benches);
