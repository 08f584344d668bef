//! End-to-end matching scenarios against an initially empty book.
//!
//! Each scenario builds on the previous book state, mirroring how the
//! engine is exercised in production: every update flows through the
//! same `execute` path, whether it rests or crosses.

use tickfan::{MarketUpdate, MatchingEngine, Side, Trade};

fn seed_asks_and_bids(engine: &MatchingEngine) {
    engine.execute(&MarketUpdate::new(Side::Ask, 105.0, 10.0));
    engine.execute(&MarketUpdate::new(Side::Ask, 106.0, 20.0));
    engine.execute(&MarketUpdate::new(Side::Bid, 104.0, 5.0));
    engine.execute(&MarketUpdate::new(Side::Bid, 103.0, 10.0));
}

#[test]
fn test_basic_book_build() {
    let engine = MatchingEngine::new();

    engine.execute(&MarketUpdate::new(Side::Ask, 101.0, 10.0));
    engine.execute(&MarketUpdate::new(Side::Ask, 102.0, 20.0));
    engine.execute(&MarketUpdate::new(Side::Ask, 103.0, 30.0));
    engine.execute(&MarketUpdate::new(Side::Bid, 100.0, 5.0));
    engine.execute(&MarketUpdate::new(Side::Bid, 99.0, 10.0));
    engine.execute(&MarketUpdate::new(Side::Bid, 98.0, 15.0));

    assert_eq!(engine.best_ask(), Some((101.0, 10.0)));
    assert_eq!(engine.best_bid(), Some((100.0, 5.0)));
}

#[test]
fn test_partial_cross() {
    let engine = MatchingEngine::new();
    seed_asks_and_bids(&engine);

    let trades = engine.execute(&MarketUpdate::new(Side::Bid, 105.0, 7.0));

    assert_eq!(
        trades,
        vec![Trade {
            taker_side: Side::Bid,
            price: 105.0,
            size: 7.0
        }]
    );
    assert_eq!(engine.best_ask(), Some((105.0, 3.0)));
    assert_eq!(engine.best_bid(), Some((104.0, 5.0)));
}

#[test]
fn test_full_consumption_with_rest() {
    let engine = MatchingEngine::new();
    seed_asks_and_bids(&engine);
    engine.execute(&MarketUpdate::new(Side::Bid, 105.0, 7.0));

    // Trades against the remaining 3 at 105; the last 1 rests as a bid.
    let trades = engine.execute(&MarketUpdate::new(Side::Bid, 105.0, 4.0));

    assert_eq!(
        trades,
        vec![Trade {
            taker_side: Side::Bid,
            price: 105.0,
            size: 3.0
        }]
    );
    assert_eq!(engine.best_ask(), Some((106.0, 20.0)));
    assert_eq!(engine.best_bid(), Some((105.0, 1.0)));
}

#[test]
fn test_reverse_cross_consumes_every_crossing_level() {
    let engine = MatchingEngine::new();
    seed_asks_and_bids(&engine);
    engine.execute(&MarketUpdate::new(Side::Bid, 105.0, 7.0));
    engine.execute(&MarketUpdate::new(Side::Bid, 105.0, 4.0));

    // An ask at 104 crosses the bid at 105 first, then the bid at 104;
    // nothing rests, so the book cannot end up crossed.
    let trades = engine.execute(&MarketUpdate::new(Side::Ask, 104.0, 2.0));

    assert_eq!(
        trades,
        vec![
            Trade {
                taker_side: Side::Ask,
                price: 105.0,
                size: 1.0
            },
            Trade {
                taker_side: Side::Ask,
                price: 104.0,
                size: 1.0
            },
        ]
    );
    assert_eq!(engine.best_ask(), Some((106.0, 20.0)));
    assert_eq!(engine.best_bid(), Some((104.0, 4.0)));
}

#[test]
fn test_sweep_out() {
    let engine = MatchingEngine::new();
    seed_asks_and_bids(&engine);
    engine.execute(&MarketUpdate::new(Side::Bid, 105.0, 7.0));
    engine.execute(&MarketUpdate::new(Side::Bid, 105.0, 4.0));

    // Consume the whole ask side; the overshoot rests on the bid.
    let trades = engine.execute(&MarketUpdate::new(Side::Bid, 106.0, 21.0));

    assert_eq!(
        trades,
        vec![Trade {
            taker_side: Side::Bid,
            price: 106.0,
            size: 20.0
        }]
    );
    assert_eq!(engine.best_ask(), None);
    assert_eq!(engine.best_bid(), Some((106.0, 1.0)));
}

#[test]
fn test_every_scenario_leaves_book_uncrossed() {
    let engine = MatchingEngine::new();
    let script = [
        MarketUpdate::new(Side::Ask, 105.0, 10.0),
        MarketUpdate::new(Side::Ask, 106.0, 20.0),
        MarketUpdate::new(Side::Bid, 104.0, 5.0),
        MarketUpdate::new(Side::Bid, 103.0, 10.0),
        MarketUpdate::new(Side::Bid, 105.0, 7.0),
        MarketUpdate::new(Side::Bid, 105.0, 4.0),
        MarketUpdate::new(Side::Ask, 104.0, 2.0),
        MarketUpdate::new(Side::Bid, 106.0, 21.0),
        MarketUpdate::new(Side::Ask, 100.0, 50.0),
    ];

    for update in &script {
        engine.execute(update);
        if let (Some((bid, _)), Some((ask, _))) = (engine.best_bid(), engine.best_ask()) {
            assert!(bid < ask, "book crossed after {update:?}: {bid} >= {ask}");
        }
    }
}

#[test]
fn test_trade_sizes_conserve_order_quantity() {
    let engine = MatchingEngine::new();
    seed_asks_and_bids(&engine);

    for order in [
        MarketUpdate::new(Side::Bid, 105.0, 7.0),
        MarketUpdate::new(Side::Bid, 106.0, 25.0),
        MarketUpdate::new(Side::Ask, 103.0, 40.0),
    ] {
        let bid_before = engine
            .snapshot()
            .level_size(order.side, order.price)
            .unwrap_or(0.0);
        let trades = engine.execute(&order);
        let filled: f64 = trades.iter().map(|t| t.size).sum();
        let rested = engine
            .snapshot()
            .level_size(order.side, order.price)
            .unwrap_or(0.0)
            - bid_before;

        assert_eq!(filled + rested, order.size, "leaked quantity on {order:?}");

        for trade in &trades {
            match order.side {
                Side::Bid => assert!(trade.price <= order.price),
                Side::Ask => assert!(trade.price >= order.price),
            }
        }
    }
}
