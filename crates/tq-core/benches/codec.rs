//! Benchmarks for the TOON codec and the query engine.
//!
//! Inputs are synthetic user tables of increasing size: the tabular fast path
//! for the encoder, row splitting for the decoder, and a select/map pipeline
//! for the evaluator.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tq_core::{decode, encode, evaluate, parse, Map, ToonOptions, Value};

fn make_users(count: usize) -> Value {
    let users = (0..count)
        .map(|i| {
            let mut user = Map::new();
            user.insert("id".to_string(), Value::from(i));
            user.insert("name".to_string(), Value::from(format!("user{i}")));
            user.insert("age".to_string(), Value::from((20 + i % 50) as i64));
            user.insert("active".to_string(), Value::from(i % 3 != 0));
            user.insert(
                "email".to_string(),
                Value::from(format!("user{i}@example.com")),
            );
            Value::Object(user)
        })
        .collect();
    let mut root = Map::new();
    root.insert("users".to_string(), Value::Array(users));
    Value::Object(root)
}

fn bench_encode(c: &mut Criterion) {
    let opts = ToonOptions::default();
    let mut group = c.benchmark_group("encode");
    for size in [10, 100, 1000] {
        let value = make_users(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &value, |b, value| {
            b.iter(|| encode(black_box(value), &opts))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let opts = ToonOptions::default();
    let mut group = c.benchmark_group("decode");
    for size in [10, 100, 1000] {
        let Ok(toon) = encode(&make_users(size), &opts) else {
            continue;
        };
        group.throughput(Throughput::Bytes(toon.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &toon, |b, toon| {
            b.iter(|| decode(black_box(toon), &opts))
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let Ok(expr) = parse("[.users[] | select(.age > 40) | {id, name}] | sort_by(.name) | length")
    else {
        return;
    };
    for size in [100, 1000] {
        let value = make_users(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &value, |b, value| {
            b.iter(|| evaluate(&expr, black_box(value)))
        });
    }
    group.bench_function("parse", |b| {
        b.iter(|| parse(black_box(".users[] | if .active then {id} else .name // \"none\" end")))
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_query);
criterion_main!(benches);
