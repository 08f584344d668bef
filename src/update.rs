//! Market update types shared by every stage of the pipeline.
//!
//! Updates arrive from the network thread and are fanned out to the
//! order-book mirror and the matching engine.

/// Book side (bid = buy, ask = sell).
///
/// The discriminants are the wire tag values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Sell side (asks)
    Ask = 0,
    /// Buy side (bids)
    Bid = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Ask => Side::Bid,
            Side::Bid => Side::Ask,
        }
    }

    /// Wire tag of this side
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a wire tag; anything other than 0 or 1 is invalid.
    #[inline]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Side::Ask),
            1 => Some(Side::Bid),
            _ => None,
        }
    }
}

/// A single market update.
///
/// In the order-book mirror an update is an absolute level snapshot:
/// `size` is the new resting size at `price`, with `0` removing the
/// level. In the matching engine the same record is an order for
/// `size` at limit `price`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarketUpdate {
    /// Which side the update applies to
    pub side: Side,
    /// Price level, tick-aligned by the venue
    pub price: f64,
    /// Level size or order quantity, depending on the consumer
    pub size: f64,
    /// Venue timestamp, nanoseconds
    pub timestamp: u64,
}

impl MarketUpdate {
    /// Create an update with a zero timestamp (the common case in tests
    /// and tools).
    #[inline]
    pub const fn new(side: Side, price: f64, size: f64) -> Self {
        Self {
            side,
            price,
            size,
            timestamp: 0,
        }
    }
}
