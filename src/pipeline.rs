//! Pipeline wiring - fans the feed into the mirror and the engine.
//!
//! One receiver thread parses datagrams and pushes every update onto two
//! independent ring buffers; a pool of book workers drains one into the
//! order-book mirror, a pool of match workers drains the other into the
//! matching engine. All threads poll a single run flag and exit once it
//! clears; whatever is left in the buffers at that point is discarded.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use tracing::{error, info};

use crate::engine::MatchingEngine;
use crate::mirror::OrderBook;
use crate::receiver::{self, PacketStats};
use crate::ring::RingBuffer;
use crate::update::MarketUpdate;

/// Slots per hand-off buffer (already a power of two)
pub const RING_CAPACITY: usize = 1 << 16;

/// Workers draining into the order-book mirror
pub const BOOK_WORKERS: usize = 4;

/// Workers draining into the matching engine
pub const MATCH_WORKERS: usize = 4;

/// First port of the dynamic/private UDP range
pub const DEFAULT_PORT: u16 = 49152;

/// Pipeline configuration, fixed at construction.
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    /// UDP port to listen on; 0 binds an ephemeral port
    pub port: u16,
    pub book_workers: usize,
    pub match_workers: usize,
    /// Pin worker threads round-robin onto CPU cores
    pub pin_workers: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            book_workers: BOOK_WORKERS,
            match_workers: MATCH_WORKERS,
            pin_workers: false,
        }
    }
}

/// Counter totals reported when the pipeline shuts down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub packets_received: u64,
    pub updates_enqueued: u64,
    pub packets_discarded: u64,
    pub updates_applied: u64,
    pub matches_executed: u64,
    pub trades_emitted: u64,
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total packets received:  {}", self.packets_received)?;
        writeln!(f, "Total updates enqueued:  {}", self.updates_enqueued)?;
        writeln!(f, "Total packets discarded: {}", self.packets_discarded)?;
        writeln!(f, "Total updates applied:   {}", self.updates_applied)?;
        writeln!(f, "Total matches executed:  {}", self.matches_executed)?;
        write!(f, "Total trades emitted:    {}", self.trades_emitted)
    }
}

/// The assembled pipeline: mirror, engine, ingress counters.
pub struct Pipeline {
    config: PipelineConfig,
    book: OrderBook,
    engine: MatchingEngine,
    stats: PacketStats,
    updates_applied: AtomicU64,
    matches_executed: AtomicU64,
    trades_emitted: Arc<AtomicU64>,
    local_addr: OnceLock<SocketAddr>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let trades_emitted = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&trades_emitted);
        let engine = MatchingEngine::with_trade_handler(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        Self {
            config,
            book: OrderBook::new(),
            engine,
            stats: PacketStats::new(),
            updates_applied: AtomicU64::new(0),
            matches_executed: AtomicU64::new(0),
            trades_emitted,
            local_addr: OnceLock::new(),
        }
    }

    /// The order-book mirror fed by this pipeline
    pub fn order_book(&self) -> &OrderBook {
        &self.book
    }

    /// The matching engine fed by this pipeline
    pub fn matching_engine(&self) -> &MatchingEngine {
        &self.engine
    }

    /// Address the feed socket bound to, once the receiver is up
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Run until `run` clears, then drain and report.
    ///
    /// A socket bind failure is reported and leaves the workers running
    /// with no input; everything else recovers locally.
    pub fn run(&self, run: &AtomicBool) -> PipelineReport {
        let book_queue: RingBuffer<MarketUpdate> = RingBuffer::new(RING_CAPACITY);
        let match_queue: RingBuffer<MarketUpdate> = RingBuffer::new(RING_CAPACITY);

        let cores = if self.config.pin_workers {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            Vec::new()
        };

        thread::scope(|s| {
            let book_queue = &book_queue;
            let match_queue = &match_queue;

            s.spawn(move || match receiver::bind_socket(self.config.port) {
                Ok(socket) => {
                    if let Ok(addr) = socket.local_addr() {
                        let _ = self.local_addr.set(addr);
                        info!(%addr, "listening for market updates");
                    }
                    receiver::run_receiver(&socket, run, book_queue, match_queue, &self.stats);
                }
                Err(err) => {
                    error!(%err, "feed socket bind failed; pipeline will receive no input");
                }
            });

            for worker in 0..self.config.book_workers {
                let core = cores.get(worker % cores.len().max(1)).copied();
                s.spawn(move || {
                    if let Some(core) = core {
                        core_affinity::set_for_current(core);
                    }
                    self.book_worker(run, book_queue);
                });
            }

            for worker in 0..self.config.match_workers {
                let core = cores
                    .get((self.config.book_workers + worker) % cores.len().max(1))
                    .copied();
                s.spawn(move || {
                    if let Some(core) = core {
                        core_affinity::set_for_current(core);
                    }
                    self.match_worker(run, match_queue);
                });
            }
        });

        self.report()
    }

    fn book_worker(&self, run: &AtomicBool, queue: &RingBuffer<MarketUpdate>) {
        while run.load(Ordering::Relaxed) {
            match queue.pop() {
                Some(update) => {
                    self.book.apply(&update);
                    self.updates_applied.fetch_add(1, Ordering::Relaxed);
                }
                None => thread::yield_now(),
            }
        }
    }

    fn match_worker(&self, run: &AtomicBool, queue: &RingBuffer<MarketUpdate>) {
        while run.load(Ordering::Relaxed) {
            match queue.pop() {
                Some(update) => {
                    self.engine.execute(&update);
                    self.matches_executed.fetch_add(1, Ordering::Relaxed);
                }
                None => thread::yield_now(),
            }
        }
    }

    fn report(&self) -> PipelineReport {
        PipelineReport {
            packets_received: self.stats.packets_received.load(Ordering::Relaxed),
            updates_enqueued: self.stats.updates_enqueued.load(Ordering::Relaxed),
            packets_discarded: self.stats.packets_discarded.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            matches_executed: self.matches_executed.load(Ordering::Relaxed),
            trades_emitted: self.trades_emitted.load(Ordering::Relaxed),
        }
    }
}
