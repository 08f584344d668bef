//! Benchmark harness using Criterion for latency measurement.
//!
//! Measures:
//! - Mirror apply (level set / remove)
//! - Engine execute (resting and crossing paths)
//! - Snapshot clone cost at depth

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tickfan::{BookState, MarketUpdate, MatchingEngine, OrderBook, Side};

/// Generate a random market update within a band
fn random_update(rng: &mut ChaCha8Rng) -> MarketUpdate {
    MarketUpdate::new(
        if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask },
        rng.gen_range(9_950..10_050) as f64,
        rng.gen_range(1..500) as f64,
    )
}

/// Benchmark: mirror apply with a pre-populated book
fn bench_mirror_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("mirror_apply");

    for depth in [10usize, 50, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let book = OrderBook::new();
            for i in 0..depth {
                book.apply(&MarketUpdate::new(Side::Bid, 9_000.0 + i as f64, 10.0));
                book.apply(&MarketUpdate::new(Side::Ask, 11_000.0 + i as f64, 10.0));
            }

            let mut rng = ChaCha8Rng::seed_from_u64(0xA11CE);
            b.iter(|| {
                let update = random_update(&mut rng);
                black_box(book.apply(&update));
            })
        });
    }

    group.finish();
}

/// Benchmark: engine execute with no crossing (pure rest)
fn bench_engine_rest(c: &mut Criterion) {
    let engine = MatchingEngine::new();

    let mut price = 0u64;
    c.bench_function("engine_rest_no_cross", |b| {
        b.iter(|| {
            price += 1;
            // Bids far below any ask: always rest, never cross.
            let update = MarketUpdate::new(Side::Bid, (price % 100) as f64, 10.0);
            black_box(engine.execute(&update));
        })
    });
}

/// Benchmark: engine execute crossing through resting depth
fn bench_engine_cross(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_cross");

    for levels in [1usize, 10, 50].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(levels), levels, |b, &levels| {
            let engine = MatchingEngine::new();

            b.iter(|| {
                // Replenish the ask ladder, then sweep it.
                for i in 0..levels {
                    engine.execute(&MarketUpdate::new(Side::Ask, 10_000.0 + i as f64, 10.0));
                }
                let sweep =
                    MarketUpdate::new(Side::Bid, 10_000.0 + levels as f64, (levels * 10) as f64);
                black_box(engine.execute(&sweep));
            })
        });
    }

    group.finish();
}

/// Benchmark: the copy cost every writer pays per install
fn bench_book_clone(c: &mut Criterion) {
    let mut group = c.benchmark_group("book_clone");

    for depth in [10usize, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let mut book = BookState::new();
            for i in 0..depth {
                book.set_level(Side::Bid, 9_000.0 + i as f64, 10.0);
                book.set_level(Side::Ask, 11_000.0 + i as f64, 10.0);
            }

            b.iter(|| black_box(book.clone()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_mirror_apply,
    bench_engine_rest,
    bench_engine_cross,
    bench_book_clone,
);

criterion_main!(benches);
