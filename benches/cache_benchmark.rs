//! Performance benchmarks for blog-cache
//!
//! This benchmark suite measures:
//! - Memory store operations (set, get, eviction)
//! - Cached computation hits and misses across payload sizes
//! - Tag invalidation over many registered keys
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use blog_cache::backend::{CacheStore, MemoryStore};
use blog_cache::{Cache, CacheConfig, CacheOptions, CacheTag, Error};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Post listing row with a configurable body size.
#[derive(Clone, Serialize, Deserialize)]
struct BenchPost {
    id: String,
    body: String,
}

fn listing(count: usize, body_size: usize) -> Vec<BenchPost> {
    (0..count)
        .map(|i| BenchPost {
            id: format!("p{}", i),
            body: "ı".repeat(body_size / 2),
        })
        .collect()
}

// ============================================================================
// Group 1: Memory Store Benchmarks
// ============================================================================

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_store");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let store = MemoryStore::new(100);
                let value = vec![1u8; size];
                b.iter(|| store.set(black_box("homepage:null"), black_box(value.clone()), None));
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let store = MemoryStore::new(100);
                store.set("homepage:null", vec![1u8; size], None);
                b.iter(|| store.get(black_box("homepage:null")));
            });
    }

    group.bench_function("get_miss", |b| {
        let store = MemoryStore::new(100);
        b.iter(|| store.get(black_box("nonexistent_key")));
    });

    // Every insert lands on a full store and evicts the oldest entry
    group.bench_function("set_with_eviction", |b| {
        let store = MemoryStore::new(100);
        let mut next = 0u64;
        b.iter(|| {
            next += 1;
            store.set(&format!("post:{}", next), vec![0u8; 256], None);
        });
    });

    group.finish();
}

// ============================================================================
// Group 2: Cached Computation Benchmarks
// ============================================================================

fn cached_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_fn");

    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        // Measures: key build + lookup + decode
        group
            .throughput(Throughput::Bytes(*size as u64 * 10))
            .bench_with_input(BenchmarkId::new("hit", size), size, |b, &size| {
                let cache = Cache::default();
                let homepage = cache.cached(
                    &["homepage"],
                    CacheOptions::new().with_tags(&[CacheTag::Homepage]),
                    move |limit: usize| async move { Ok::<_, Error>(listing(limit, size)) },
                );

                rt.block_on(async {
                    homepage.call(10).await.expect("Failed to populate cache");
                });

                b.to_async(&rt)
                    .iter(|| async { homepage.call(black_box(10)).await });
            });

        // Measures: key build + lookup + compute + encode + store
        group
            .throughput(Throughput::Bytes(*size as u64 * 10))
            .bench_with_input(BenchmarkId::new("miss", size), size, |b, &size| {
                let cache = Cache::new(CacheConfig::default().with_capacity(10_000));
                let post = cache.cached(&["post"], CacheOptions::new(), move |id: u32| async move {
                    Ok::<_, Error>(listing(10, size).into_iter().nth(id as usize % 10))
                });
                let counter = Arc::new(AtomicU32::new(0));

                b.to_async(&rt).iter(|| {
                    let counter = counter.clone();
                    let post = post.clone();
                    async move {
                        // Unique argument per iteration forces a miss
                        let id = counter.fetch_add(1, Ordering::Relaxed);
                        post.call(black_box(id)).await
                    }
                });
            });
    }

    group.finish();
}

// ============================================================================
// Group 3: Invalidation Benchmarks
// ============================================================================

fn invalidation_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("invalidation");

    for keys in [10, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("invalidate_tag", keys), keys, |b, &keys| {
            let cache = Cache::new(CacheConfig::default().with_capacity(keys));
            b.iter(|| {
                for i in 0..keys {
                    let key = format!("post:{}", i);
                    cache.store().set(&key, vec![0u8; 64], None);
                    cache
                        .registry()
                        .register(&key, &[CacheTag::Posts, CacheTag::Homepage]);
                }
                cache.invalidate_tag(black_box(CacheTag::Posts))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    store_benchmarks,
    cached_benchmarks,
    invalidation_benchmarks
);
criterion_main!(benches);
