//! Book state - an immutable snapshot of both sides of a price-level book.
//!
//! A `BookState` is a plain value: writers clone the published snapshot,
//! mutate the clone, and install it through the snapshot cell. Levels are
//! aggregated `(price, total size)` pairs, not per-order records.
//!
//! Level mutation is explicit about its semantics at every call site:
//! venue snapshots are *absolute* (`set_level`), while the matching
//! engine applies *signed deltas* (`add` / `reduce` / `remove_level`).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use ordered_float::OrderedFloat;

use crate::update::Side;

/// Upper bound on price levels retained per side.
///
/// An insertion beyond this evicts the worst end of the side: the lowest
/// bid or the highest ask.
pub const MAX_DEPTH: usize = 100;

type Levels = BTreeMap<OrderedFloat<f64>, f64>;

/// One consistent snapshot of bids and asks.
///
/// Both sides are stored in ascending price order: the best bid is the
/// last bid key, the best ask the first ask key. All retained sizes are
/// strictly positive. Equality is value equality; `Clone` is the deep
/// copy a writer must take before mutating.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookState {
    bids: Levels,
    asks: Levels,
}

impl BookState {
    /// The empty initial state
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn levels(&self, side: Side) -> &Levels {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    #[inline]
    fn levels_mut(&mut self, side: Side) -> &mut Levels {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Absolute level replacement, the venue-snapshot semantics: the new
    /// resting size at `price` is `size`, and `size == 0` removes the
    /// level.
    pub fn set_level(&mut self, side: Side, price: f64, size: f64) {
        let levels = self.levels_mut(side);
        if size == 0.0 {
            levels.remove(&OrderedFloat(price));
        } else {
            levels.insert(OrderedFloat(price), size);
            self.enforce_depth(side);
        }
    }

    /// Accumulate `size` onto the level at `price`, creating it if absent.
    pub fn add(&mut self, side: Side, price: f64, size: f64) {
        let levels = self.levels_mut(side);
        *levels.entry(OrderedFloat(price)).or_insert(0.0) += size;
        self.enforce_depth(side);
    }

    /// Subtract `size` from the level at `price`; a level whose size is
    /// fully consumed is removed so sizes stay strictly positive.
    pub fn reduce(&mut self, side: Side, price: f64, size: f64) {
        let levels = self.levels_mut(side);
        if let Some(resting) = levels.get_mut(&OrderedFloat(price)) {
            *resting -= size;
            if *resting <= 0.0 {
                levels.remove(&OrderedFloat(price));
            }
        }
    }

    /// Remove the level at `price`, if present.
    pub fn remove_level(&mut self, side: Side, price: f64) {
        self.levels_mut(side).remove(&OrderedFloat(price));
    }

    fn enforce_depth(&mut self, side: Side) {
        let levels = self.levels_mut(side);
        if levels.len() > MAX_DEPTH {
            match side {
                // Worst bid is the lowest price, worst ask the highest.
                Side::Bid => levels.pop_first(),
                Side::Ask => levels.pop_last(),
            };
        }
    }

    /// Whether a side holds no levels
    #[inline]
    pub fn is_empty(&self, side: Side) -> bool {
        self.levels(side).is_empty()
    }

    /// Number of levels on a side
    #[inline]
    pub fn depth(&self, side: Side) -> usize {
        self.levels(side).len()
    }

    /// Highest bid as `(price, size)`
    #[inline]
    pub fn best_bid(&self) -> Option<(f64, f64)> {
        self.bids
            .last_key_value()
            .map(|(price, size)| (price.into_inner(), *size))
    }

    /// Lowest ask as `(price, size)`
    #[inline]
    pub fn best_ask(&self) -> Option<(f64, f64)> {
        self.asks
            .first_key_value()
            .map(|(price, size)| (price.into_inner(), *size))
    }

    /// Resting size at an exact price, if the level exists
    #[inline]
    pub fn level_size(&self, side: Side, price: f64) -> Option<f64> {
        self.levels(side).get(&OrderedFloat(price)).copied()
    }

    /// Render both sides best-first, up to `depth` rows each, for
    /// diagnostics.
    pub fn render(&self, depth: usize) -> String {
        let depth = depth.min(MAX_DEPTH);
        let mut out = String::new();

        out.push_str("Asks:\n");
        for (price, size) in self.asks.iter().take(depth) {
            let _ = writeln!(out, "{} @{}", price.into_inner(), size);
        }
        out.push_str("Bids:\n");
        for (price, size) in self.bids.iter().rev().take(depth) {
            let _ = writeln!(out, "{} @{}", price.into_inner(), size);
        }
        out
    }
}
