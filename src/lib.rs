//! # Tickfan
//!
//! A low-latency ingestion and matching pipeline for a cryptocurrency
//! market-data feed.
//!
//! ## Design Principles
//!
//! - **Snapshot publication**: the book is an immutable value swapped in
//!   by CAS; readers never block
//! - **MPMC hand-off**: one bounded slot-sequenced ring buffer per
//!   consumer pool, no mutex on any hot path
//! - **Explicit yielding**: threads give up the CPU only on empty pop,
//!   full push, or a lost CAS
//!
//! ## Architecture
//!
//! ```text
//!                      +--> [Ring Buffer] --> [Book Workers]  --> OrderBook
//! [UDP Receiver] --+---|
//!                      +--> [Ring Buffer] --> [Match Workers] --> MatchingEngine --> trades
//! ```

pub mod book;
pub mod engine;
pub mod mirror;
pub mod pipeline;
pub mod receiver;
pub mod ring;
mod snapshot;
pub mod update;
pub mod wire;

// Re-exports for convenience
pub use book::{BookState, MAX_DEPTH};
pub use engine::{MatchingEngine, Trade, TradeHandler};
pub use mirror::OrderBook;
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};
pub use ring::RingBuffer;
pub use update::{MarketUpdate, Side};
