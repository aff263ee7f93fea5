use criterion::{criterion_group, criterion_main, Criterion};
use ragcore::tokenizer::tokenize;
use ragcore::{Chunk, IndexOptions, VectorIndex};

const TEXT: &str = "Customers who miss a premium payment are offered a grace period extension. \
Loyalty discounts apply after long tenure, and competitor price comparisons are handled by retention agents.";

fn corpus(n: usize) -> Vec<Chunk> {
    (0..n)
        .map(|i| Chunk::new(&format!("{TEXT} policy {i} region {}", i % 17), &format!("[Doc{}]", i % 50), "bench.md"))
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_paragraph", |b| b.iter(|| tokenize(TEXT)));
}

fn bench_retrieve(c: &mut Criterion) {
    let idx = VectorIndex::build(corpus(2_000), IndexOptions::default());
    c.bench_function("retrieve_2000_chunks", |b| b.iter(|| idx.retrieve("missed payment grace extension", 3)));
}

criterion_group!(benches, bench_tokenize, bench_retrieve);
criterion_main!(benches);
