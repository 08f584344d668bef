//! Matching engine - crosses incoming orders against its own mirrored
//! book and emits trade events.
//!
//! Same snapshot-CAS discipline as the mirror, with a two-phase mutation
//! per update:
//!
//! 1. CROSSING: consume opposite levels while they still cross the
//!    incoming price
//! 2. RESTING: accumulate any remainder at the incoming price
//!
//! Trades composed during a lost CAS race are discarded with the
//! candidate state; the handler only ever sees trades whose book state
//! was actually installed.

use crate::book::BookState;
use crate::snapshot::SharedBook;
use crate::update::{MarketUpdate, Side};

/// A fill produced by crossing an incoming order against a resting level
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trade {
    /// Side of the incoming (aggressive) order
    pub taker_side: Side,
    /// Price of the consumed resting level
    pub price: f64,
    /// Quantity filled at that level
    pub size: f64,
}

/// Owned callback invoked once per committed trade, in generation order,
/// on the thread that installed the corresponding state. Must not call
/// back into the engine.
pub type TradeHandler = Box<dyn Fn(Trade) + Send + Sync>;

/// Lock-free matching engine over a snapshot-published book.
pub struct MatchingEngine {
    state: SharedBook,
    on_trade: Option<TradeHandler>,
}

impl MatchingEngine {
    /// Create an engine without a trade handler
    pub fn new() -> Self {
        Self {
            state: SharedBook::new(),
            on_trade: None,
        }
    }

    /// Create an engine that reports every committed trade to `handler`
    pub fn with_trade_handler(handler: impl Fn(Trade) + Send + Sync + 'static) -> Self {
        Self {
            state: SharedBook::new(),
            on_trade: Some(Box::new(handler)),
        }
    }

    /// Cross `update` against the book and install the resulting state.
    ///
    /// Returns the committed trades in generation order, after the
    /// handler (if any) has seen each of them.
    pub fn execute(&self, update: &MarketUpdate) -> Vec<Trade> {
        let trades = self.state.publish(|book| Self::cross(book, update));

        if let Some(on_trade) = &self.on_trade {
            for trade in &trades {
                on_trade(*trade);
            }
        }
        trades
    }

    /// The pure matching step, applied to a candidate state.
    fn cross(book: &mut BookState, update: &MarketUpdate) -> Vec<Trade> {
        let mut trades = Vec::new();
        let mut remaining = update.size;
        let taker = update.side;
        let maker = taker.opposite();

        while remaining > 0.0 {
            let Some((level_price, level_size)) = (match taker {
                Side::Bid => book.best_ask(),
                Side::Ask => book.best_bid(),
            }) else {
                break;
            };

            let crosses = match taker {
                Side::Bid => level_price <= update.price,
                Side::Ask => level_price >= update.price,
            };
            if !crosses {
                break;
            }

            let traded = remaining.min(level_size);
            trades.push(Trade {
                taker_side: taker,
                price: level_price,
                size: traded,
            });

            if traded == level_size {
                book.remove_level(maker, level_price);
            } else {
                book.reduce(maker, level_price, traded);
            }
            remaining -= traded;
        }

        // Nothing on the opposite side crosses the remainder, so resting
        // it keeps the book uncrossed.
        if remaining > 0.0 {
            book.add(taker, update.price, remaining);
        }

        trades
    }

    /// Highest resting bid as `(price, size)`
    pub fn best_bid(&self) -> Option<(f64, f64)> {
        self.state.read(BookState::best_bid)
    }

    /// Lowest resting ask as `(price, size)`
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

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}
