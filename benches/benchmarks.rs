use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hamt_map::HamtMap;
use rand::prelude::*;
use std::collections::HashMap;

// Benchmarking module for HamtMap.
// These benchmarks are not exhaustive, and they focus on KPIs like insert and get against
// the standard HashMap baseline.
// To run benchmarks, use the following command:
// cargo bench --bench benchmarks

fn bench_insert(c: &mut Criterion) {
    c.bench_function("HamtMap, N=1e4, insert", |b| {
        let mut map = HamtMap::new();
        b.iter(|| {
            for i in 0..10_000_u64 {
                black_box(map.insert(i, i));
            }
        })
    });
}

fn bench_insert_hashmap(c: &mut Criterion) {
    c.bench_function("HashMap, N=1e4, insert", |b| {
        let mut map = HashMap::new();
        b.iter(|| {
            for i in 0..10_000_u64 {
                black_box(map.insert(i, i));
            }
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let mut map = HamtMap::new();
    for i in 0..10_000_u64 {
        map.insert(i, i);
    }
    c.bench_function("HamtMap, N=1e4, get", |b| {
        b.iter(|| {
            black_box(map.get(&5_000));
        })
    });
}

fn bench_get_hashmap(c: &mut Criterion) {
    let mut map = HashMap::new();
    for i in 0..10_000_u64 {
        map.insert(i, i);
    }
    c.bench_function("HashMap, N=1e4, get", |b| {
        b.iter(|| {
            black_box(map.get(&5_000));
        })
    });
}

fn bench_insert_random_keys(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xA11C_E5ED);
    let keys: Vec<u64> = (0..10_000).map(|_| rng.gen()).collect();

    c.bench_function("HamtMap, N=1e4, insert random", |b| {
        b.iter(|| {
            let mut map = HamtMap::new();
            for &key in &keys {
                map.insert(key, key);
            }
            black_box(map.len())
        })
    });
}

fn bench_get_random_keys(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xA11C_E5ED);
    let keys: Vec<u64> = (0..10_000).map(|_| rng.gen()).collect();

    let mut map = HamtMap::new();
    for &key in &keys {
        map.insert(key, key);
    }

    c.bench_function("HamtMap, N=1e4, get random", |b| {
        b.iter(|| {
            for key in keys.iter().step_by(97) {
                black_box(map.get(key));
            }
        })
    });
}

fn bench_iter(c: &mut Criterion) {
    let mut map = HamtMap::new();
    for i in 0..10_000_u64 {
        map.insert(i, i);
    }
    c.bench_function("HamtMap, N=1e4, iter", |b| {
        b.iter(|| {
            black_box(map.iter().count());
        })
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_insert_hashmap,
    bench_get,
    bench_get_hashmap,
    bench_insert_random_keys,
    bench_get_random_keys,
    bench_iter,
);

criterion_main!(benches);
