use hdrhistogram::Histogram;
use std::time::Instant;
use tickfan::{MarketUpdate, MatchingEngine, OrderBook, Side};

const ITERATIONS: usize = 1_000_000;
const WARMUP: usize = 10_000;

/// Deterministic update stream: alternating sides across 100 price
/// levels, sized so roughly half the engine executions cross.
fn generate_updates(count: usize) -> Vec<MarketUpdate> {
    (0..count)
        .map(|i| {
            let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
            let level = (i % 100) as f64;
            let price = match side {
                Side::Bid => 9_950.0 + level,
                Side::Ask => 10_000.0 + level,
            };
            MarketUpdate::new(side, price, 1.0 + (i % 7) as f64)
        })
        .collect()
}

fn percentile_table(label: &str, histogram: &Histogram<u64>) {
    println!("\n=== {label} latency (ns) ===");
    println!("Min:    {:6}", histogram.min());
    println!("P50:    {:6}", histogram.value_at_quantile(0.50));
    println!("P90:    {:6}", histogram.value_at_quantile(0.90));
    println!("P99:    {:6}", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6}", histogram.value_at_quantile(0.999));
    println!("Max:    {:6}", histogram.max());
}

fn main() {
    println!("Preparing latency report...");
    let updates = generate_updates(ITERATIONS.max(WARMUP));

    // Order-book mirror: apply absolute level updates.
    let book = OrderBook::new();
    for update in updates.iter().take(WARMUP) {
        std::hint::black_box(book.apply(update));
    }

    let mut mirror_hist = Histogram::<u64>::new(3).unwrap();
    let mut total = std::time::Duration::ZERO;
    for update in updates.iter().take(ITERATIONS) {
        let start = Instant::now();
        std::hint::black_box(book.apply(update));
        let elapsed = start.elapsed();
        mirror_hist.record(elapsed.as_nanos() as u64).unwrap_or(());
        total += elapsed;
    }
    println!(
        "Mirror throughput: {:.2} updates/sec",
        ITERATIONS as f64 / total.as_secs_f64()
    );
    percentile_table("mirror apply", &mirror_hist);

    // Matching engine: same stream, crossing roughly half the time.
    let engine = MatchingEngine::new();
    for update in updates.iter().take(WARMUP) {
        std::hint::black_box(engine.execute(update));
    }

    let mut engine_hist = Histogram::<u64>::new(3).unwrap();
    let mut total = std::time::Duration::ZERO;
    for update in updates.iter().take(ITERATIONS) {
        let start = Instant::now();
        std::hint::black_box(engine.execute(update));
        let elapsed = start.elapsed();
        engine_hist.record(elapsed.as_nanos() as u64).unwrap_or(());
        total += elapsed;
    }
    println!(
        "\nEngine throughput: {:.2} updates/sec",
        ITERATIONS as f64 / total.as_secs_f64()
    );
    percentile_table("engine execute", &engine_hist);
}
