//! Benchmarks for cache key derivation performance
//!
//! This benchmark measures:
//! - Canonical serialization plus hashing for typical announcement texts
//! - Overhead of per-message option maps of varying size

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use herald::cache::CacheKey;
use herald::types::SynthesisRequest;

fn create_short_request() -> SynthesisRequest {
    SynthesisRequest::new("Front door is open")
}

fn create_configured_request() -> SynthesisRequest {
    SynthesisRequest::new("Washing machine finished, please empty it")
        .with_option("voice", "alloy")
        .with_option("response_format", "opus")
        .with_option("volume", "80")
}

fn create_long_request() -> SynthesisRequest {
    let mut text = String::new();
    for i in 0..40 {
        text.push_str(&format!("Sensor {} reported a state change. ", i));
    }
    let mut request = SynthesisRequest::new(text);
    for i in 0..16 {
        request = request.with_option(format!("param_{}", i), format!("value_{}", i));
    }
    request
}

fn bench_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_derivation");

    let short_request = create_short_request();
    let configured_request = create_configured_request();
    let long_request = create_long_request();

    group.bench_with_input(
        BenchmarkId::new("derive", "short_text"),
        &short_request,
        |b, req| b.iter(|| CacheKey::derive(black_box(req))),
    );

    group.bench_with_input(
        BenchmarkId::new("derive", "with_options"),
        &configured_request,
        |b, req| b.iter(|| CacheKey::derive(black_box(req))),
    );

    group.bench_with_input(
        BenchmarkId::new("derive", "long_text_many_options"),
        &long_request,
        |b, req| b.iter(|| CacheKey::derive(black_box(req))),
    );

    group.finish();
}

fn bench_canonical_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonical_serialization");

    let requests: Vec<SynthesisRequest> = (0..10)
        .map(|i| {
            SynthesisRequest::new(format!("Announcement number {}", i))
                .with_option("voice", "alloy")
        })
        .collect();

    group.throughput(Throughput::Elements(requests.len() as u64));

    group.bench_function("serialize_requests", |b| {
        b.iter(|| {
            let _: Vec<String> = black_box(&requests)
                .iter()
                .map(|r| serde_json::to_string(r).unwrap())
                .collect();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_key_derivation, bench_canonical_serialization);
criterion_main!(benches);
