//! Performance benchmarks for phraserule.
//!
//! Run with: cargo bench --features bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use phraserule::{
    apply, apply_full_scan, build_index, cache::CacheReader, cache::CacheWriter, Engine,
    EngineConfig, Rule,
};

/// Generate `count` word and phrase rules with distinct keywords.
fn generate_rules(count: usize) -> Vec<Rule> {
    (0..count)
        .map(|i| {
            if i % 3 == 0 {
                Rule::new(format!(r"\bhow to fix item{}\b", i), format!("repair guide {}", i))
            } else {
                Rule::new(format!(r"\bword{}\b", i), format!("term{}", i))
            }
        })
        .collect()
}

/// Generate inputs where `hit_ratio` of them mention a rule keyword.
fn generate_inputs(count: usize, rule_count: usize, hit_ratio: f64) -> Vec<String> {
    let hits = (count as f64 * hit_ratio) as usize;
    let mut inputs = Vec::with_capacity(count);

    for i in 0..hits {
        inputs.push(format!("please tell me about word{} today", (i * 3 + 1) % rule_count));
    }
    for i in hits..count {
        inputs.push(format!("an unrelated sentence number {}", i));
    }

    inputs
}

/// Indexed apply against a full scan as the rule count grows.
fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");

    for size in [100, 1_000, 10_000].iter() {
        let indexed = build_index(generate_rules(*size));
        let inputs = generate_inputs(100, *size, 0.8);

        group.throughput(Throughput::Elements(inputs.len() as u64));
        group.bench_with_input(BenchmarkId::new("indexed", size), size, |b, _| {
            b.iter(|| {
                for input in &inputs {
                    black_box(apply(input, &indexed.rules, &indexed.index));
                }
            })
        });

        // full scans get slow quickly; keep the sample small
        if *size <= 1_000 {
            group.bench_with_input(BenchmarkId::new("full_scan", size), size, |b, _| {
                b.iter(|| {
                    for input in inputs.iter().take(10) {
                        black_box(apply_full_scan(input, &indexed.rules));
                    }
                })
            });
        }
    }

    group.finish();
}

/// Engine transforms with and without the result cache.
fn bench_result_cache(c: &mut Criterion) {
    let inputs = generate_inputs(1_000, 10_000, 0.8);
    let mut group = c.benchmark_group("result_cache");
    group.throughput(Throughput::Elements(inputs.len() as u64));

    let no_cache = Engine::from_indexed(
        build_index(generate_rules(10_000)),
        EngineConfig::new("bench.txt", "bench.idx").no_result_cache(),
    );
    group.bench_function("no_cache", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(no_cache.transform(input));
            }
        })
    });

    let cached = Engine::from_indexed(
        build_index(generate_rules(10_000)),
        EngineConfig::new("bench.txt", "bench.idx").with_result_cache(10_000),
    );
    for input in &inputs {
        let _ = cached.transform(input);
    }
    group.bench_function("cache_hit", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(cached.transform(input));
            }
        })
    });

    group.finish();
}

/// Index build against decoding the same index from cache bytes.
fn bench_load(c: &mut Criterion) {
    let rules = generate_rules(10_000);
    let indexed = build_index(rules.clone());
    let data = CacheWriter::new().write(&indexed).unwrap();

    println!(
        "Cache for {} rules: {} bytes ({:.2} KB)",
        rules.len(),
        data.len(),
        data.len() as f64 / 1024.0
    );

    let mut group = c.benchmark_group("load");

    group.bench_function("build_10k_rules", |b| {
        b.iter_batched(
            || rules.clone(),
            |rules| black_box(build_index(rules)),
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("decode_10k_rules", |b| {
        b.iter(|| black_box(CacheReader::from_bytes(&data).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_scalability, bench_result_cache, bench_load);

criterion_main!(benches);
