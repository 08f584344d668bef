//! Order-book mirror - a passive replica of the venue's top of book.
//!
//! Each update is an absolute level snapshot from the venue, applied by
//! cloning the current state and compare-and-swapping the clone in.
//! Readers never block; a mirror may momentarily show a crossed book,
//! since it replays whatever the venue published.

use crate::book::BookState;
use crate::snapshot::SharedBook;
use crate::update::MarketUpdate;

/// Lock-free mirrored price-level book.
///
/// Writers are lock-free but not starvation-free: a writer that keeps
/// losing the CAS retries against the winner's state, so every
/// successful install commits exactly one update globally.
pub struct OrderBook {
    state: SharedBook,
}

impl OrderBook {
    /// Create an empty mirror
    pub fn new() -> Self {
        Self {
            state: SharedBook::new(),
        }
    }

    /// Apply one venue update to the published state.
    pub fn apply(&self, update: &MarketUpdate) {
        self.state
            .publish(|book| book.set_level(update.side, update.price, update.size));
    }

    /// Highest mirrored bid as `(price, size)`
    pub fn best_bid(&self) -> Option<(f64, f64)> {
        self.state.read(BookState::best_bid)
    }

    /// Lowest mirrored ask as `(price, size)`
    pub fn best_ask(&self) -> Option<(f64, f64)> {
        self.state.read(BookState::best_ask)
    }

    /// Render the current snapshot up to `depth` rows per side
    pub fn render(&self, depth: usize) -> String {
        self.state.read(|book| book.render(depth))
    }

    /// Clone the current snapshot, for inspection off the hot path
    pub fn snapshot(&self) -> BookState {
        self.state.read(BookState::clone)
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
