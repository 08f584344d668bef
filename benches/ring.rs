//! Ring buffer benchmarks.
//!
//! Measures single-thread push/pop cost and full MPMC throughput with
//! the pipeline's 4x4 producer/consumer shape.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tickfan::{MarketUpdate, RingBuffer, Side};

/// Benchmark: uncontended push+pop round trip
fn bench_push_pop(c: &mut Criterion) {
    let ring: RingBuffer<MarketUpdate> = RingBuffer::new(1024);
    let update = MarketUpdate::new(Side::Bid, 10_000.0, 1.0);

    c.bench_function("ring_push_pop_uncontended", |b| {
        b.iter(|| {
            ring.push(black_box(update)).unwrap();
            black_box(ring.pop().unwrap());
        })
    });
}

/// Benchmark: 4 producers x 4 consumers moving a fixed item count
fn bench_mpmc_throughput(c: &mut Criterion) {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const ITEMS_PER_PRODUCER: usize = 10_000;
    const TOTAL: usize = PRODUCERS * ITEMS_PER_PRODUCER;

    let mut group = c.benchmark_group("ring_mpmc");
    group.throughput(Throughput::Elements(TOTAL as u64));

    group.bench_function("4p_4c_10k_each", |b| {
        b.iter(|| {
            let ring: RingBuffer<usize> = RingBuffer::new(10_240);
            let consumed = AtomicUsize::new(0);

            thread::scope(|s| {
                for producer in 0..PRODUCERS {
                    let ring = &ring;
                    s.spawn(move || {
                        let base = producer * ITEMS_PER_PRODUCER;
                        for i in 0..ITEMS_PER_PRODUCER {
                            let mut value = base + i;
                            loop {
                                match ring.push(value) {
                                    Ok(()) => break,
                                    Err(back) => {
                                        value = back;
                                        thread::yield_now();
                                    }
                                }
                            }
                        }
                    });
                }

                for _ in 0..CONSUMERS {
                    let ring = &ring;
                    let consumed = &consumed;
                    s.spawn(move || loop {
                        match ring.pop() {
                            Some(value) => {
                                black_box(value);
                                consumed.fetch_add(1, Ordering::Relaxed);
                            }
                            None => {
                                if consumed.load(Ordering::Relaxed) >= TOTAL {
                                    break;
                                }
                                thread::yield_now();
                            }
                        }
                    });
                }
            });

            assert_eq!(consumed.load(Ordering::Relaxed), TOTAL);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_mpmc_throughput);

criterion_main!(benches);
