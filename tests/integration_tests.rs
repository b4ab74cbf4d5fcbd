//! End-to-end scenarios across the book, the engine, the risk gate, and the
//! strategy pipeline. Prices are in ticks (1 tick = $0.01 equivalents in the
//! scenario comments).

use std::sync::Arc;

use latency_profiler::PerformanceMonitor;
use market_data::{MarketDataFeed, MarketUpdate};
use matching_engine::{MatchOutcome, MatchingEngine};
use order_book::{Order, OrderId, OrderIdAllocator, Price, Quantity, Side, TickScale};
use parking_lot::Mutex;
use risk_manager::{RiskConfig, RiskFilter};
use strategy_engine::{StrategyConfig, StrategyEngine, StrategyMode};

use tickmatch::metrics::SystemMetrics;
use tickmatch::pipeline::{OrderGateway, StrategyRunner};

fn limit(id: u64, side: Side, price: u64, qty: u64) -> Order {
    Order::limit(
        OrderId::from_raw(id),
        side,
        Price::from_raw(price),
        Quantity::from_raw(qty),
    )
}

fn market(id: u64, side: Side, qty: u64) -> Order {
    Order::market(OrderId::from_raw(id), side, Quantity::from_raw(qty))
}

fn ticks(value: u64) -> Price {
    Price::from_raw(value)
}

#[test]
fn no_cross_rest() {
    // S1: both orders rest without trading.
    let engine = MatchingEngine::new("ACME");

    let outcome = engine.submit(limit(1, Side::Buy, 9_900, 10)).unwrap();
    assert_eq!(outcome, MatchOutcome::NoMatch);
    assert_eq!(engine.top_of_book(), (ticks(9_900), Price::ZERO));

    let outcome = engine.submit(limit(2, Side::Sell, 10_100, 10)).unwrap();
    assert_eq!(outcome, MatchOutcome::NoMatch);
    assert_eq!(engine.top_of_book(), (ticks(9_900), ticks(10_100)));
    assert!(engine.trade_events().is_empty());
}

#[test]
fn full_fill_at_resting_price() {
    // S2: the aggressive buy pays the resting ask's price.
    let engine = MatchingEngine::new("ACME");
    engine.submit(limit(1, Side::Buy, 9_900, 10)).unwrap();
    engine.submit(limit(2, Side::Sell, 10_100, 10)).unwrap();

    let outcome = engine.submit(limit(3, Side::Buy, 10_100, 10)).unwrap();
    let trades = outcome.trades();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].buy_order_id, OrderId::from_raw(3));
    assert_eq!(trades[0].sell_order_id, OrderId::from_raw(2));
    assert_eq!(trades[0].price, ticks(10_100));
    assert_eq!(trades[0].quantity, Quantity::from_raw(10));

    assert_eq!(engine.top_of_book(), (ticks(9_900), Price::ZERO));
}

#[test]
fn partial_fill_then_rest() {
    // S3: the remainder of the aggressive buy rests on the bid side.
    let engine = MatchingEngine::new("ACME");
    engine.submit(limit(4, Side::Sell, 10_000, 5)).unwrap();

    let outcome = engine.submit(limit(5, Side::Buy, 10_000, 8)).unwrap();
    match outcome {
        MatchOutcome::Partial { trades, remaining } => {
            assert_eq!(trades.len(), 1);
            assert_eq!(trades[0].buy_order_id, OrderId::from_raw(5));
            assert_eq!(trades[0].sell_order_id, OrderId::from_raw(4));
            assert_eq!(trades[0].price, ticks(10_000));
            assert_eq!(trades[0].quantity, Quantity::from_raw(5));
            assert_eq!(remaining, Quantity::from_raw(3));
        }
        other => panic!("expected partial fill, got {other:?}"),
    }

    assert_eq!(engine.top_of_book(), (ticks(10_000), Price::ZERO));
    assert_eq!(
        engine.depth(Side::Buy, 1),
        vec![(ticks(10_000), Quantity::from_raw(3))]
    );
}

#[test]
fn market_order_sweeps_levels() {
    // S4: a market buy walks the ask ladder best-first.
    let engine = MatchingEngine::new("ACME");
    engine.submit(limit(6, Side::Sell, 10_000, 4)).unwrap();
    engine.submit(limit(7, Side::Sell, 10_001, 3)).unwrap();

    let outcome = engine.submit(market(8, Side::Buy, 6)).unwrap();
    let trades = outcome.trades();
    assert_eq!(trades.len(), 2);

    assert_eq!(trades[0].buy_order_id, OrderId::from_raw(8));
    assert_eq!(trades[0].sell_order_id, OrderId::from_raw(6));
    assert_eq!(trades[0].price, ticks(10_000));
    assert_eq!(trades[0].quantity, Quantity::from_raw(4));

    assert_eq!(trades[1].buy_order_id, OrderId::from_raw(8));
    assert_eq!(trades[1].sell_order_id, OrderId::from_raw(7));
    assert_eq!(trades[1].price, ticks(10_001));
    assert_eq!(trades[1].quantity, Quantity::from_raw(2));

    assert_eq!(
        engine.depth(Side::Sell, 1),
        vec![(ticks(10_001), Quantity::from_raw(1))]
    );
}

#[test]
fn cancel_then_cancel_again() {
    // S5: cancel succeeds once, then reports unknown.
    let engine = MatchingEngine::new("ACME");
    engine.submit(limit(1, Side::Buy, 9_900, 10)).unwrap();
    engine.submit(limit(2, Side::Sell, 10_100, 10)).unwrap();

    assert!(engine.cancel(OrderId::from_raw(1)));
    assert_eq!(engine.top_of_book(), (Price::ZERO, ticks(10_100)));
    assert!(!engine.cancel(OrderId::from_raw(1)));
}

#[test]
fn risk_drop_never_reaches_engine() {
    // S6: an oversized order dies at the gate.
    let metrics = Arc::new(SystemMetrics::new());
    let gateway = OrderGateway::new(
        Arc::new(MatchingEngine::new("ACME")),
        Arc::new(RiskFilter::with_config(RiskConfig {
            max_order_quantity: 100,
            ..RiskConfig::default()
        })),
        Arc::new(PerformanceMonitor::new()),
        metrics.clone(),
    );

    let trades = gateway.submit_batch(vec![limit(1, Side::Buy, 9_900, 200)]);
    assert!(trades.is_empty());
    assert_eq!(gateway.engine().processed_orders(), 0);
    assert_eq!(gateway.risk().orders_rejected(), 1);
    assert_eq!(metrics.orders_rejected(), 1);
}

#[test]
fn submit_then_cancel_restores_the_book() {
    // Algebraic law: submit of a cancellable LIMIT followed by its cancel is
    // a no-op on the book, metrics aside.
    let engine = MatchingEngine::new("ACME");
    engine.submit(limit(1, Side::Buy, 9_800, 4)).unwrap();
    engine.submit(limit(2, Side::Buy, 9_900, 6)).unwrap();
    engine.submit(limit(3, Side::Sell, 10_100, 5)).unwrap();

    let bids_before = engine.depth(Side::Buy, 16);
    let asks_before = engine.depth(Side::Sell, 16);
    let resting_before = engine.resting_order_count();

    engine.submit(limit(9, Side::Buy, 9_850, 7)).unwrap();
    assert!(engine.cancel(OrderId::from_raw(9)));

    assert_eq!(engine.depth(Side::Buy, 16), bids_before);
    assert_eq!(engine.depth(Side::Sell, 16), asks_before);
    assert_eq!(engine.resting_order_count(), resting_before);
}

#[test]
fn oversized_market_order_empties_the_side() {
    // Algebraic law: a market order for at least the whole opposite side
    // consumes exactly that liquidity.
    let engine = MatchingEngine::new("ACME");
    let mut total = 0;
    for (id, (price, qty)) in [(10_000, 4), (10_002, 9), (10_005, 2)].iter().enumerate() {
        engine
            .submit(limit(id as u64 + 1, Side::Sell, *price, *qty))
            .unwrap();
        total += qty;
    }

    let outcome = engine.submit(market(50, Side::Buy, total + 25)).unwrap();
    let consumed: u64 = outcome
        .trades()
        .iter()
        .map(|trade| trade.quantity.to_raw())
        .sum();

    assert_eq!(consumed, total);
    assert_eq!(engine.top_of_book(), (Price::ZERO, Price::ZERO));
    assert_eq!(engine.resting_order_count(), 0);
}

#[test]
fn feed_to_strategy_to_engine_round_trip() {
    // The full loop: trades reach the strategy through the fan-out, the buy
    // signal becomes a LIMIT order, the order crosses resting liquidity, and
    // the fill lands in the strategy's ledger.
    let scale = TickScale::new(0.01);
    let engine = Arc::new(MatchingEngine::new("ACME"));
    let metrics = Arc::new(SystemMetrics::new());
    let monitor = Arc::new(PerformanceMonitor::new());
    monitor.start();
    let gateway = Arc::new(OrderGateway::new(
        engine.clone(),
        Arc::new(RiskFilter::new()),
        monitor.clone(),
        metrics.clone(),
    ));
    let ids = Arc::new(OrderIdAllocator::starting_at(1_000));

    // Resting ask well below where the trend is heading, so the momentum
    // buy crosses it immediately.
    gateway.submit_batch(vec![limit(1, Side::Sell, 9_900, 50)]);

    let strategy = StrategyEngine::with_tick_scale(
        "momentum",
        StrategyMode::Momentum,
        StrategyConfig {
            momentum_threshold: 0.2,
            short_period: 3,
            long_period: 5,
            rsi_period: 5,
            position_size: 10,
            stop_loss_pct: 90.0,
            take_profit_pct: 500.0,
            ..StrategyConfig::default()
        },
        scale,
    );
    let runner = StrategyRunner::new("ACME", strategy, gateway.clone(), ids);
    let handle: Arc<Mutex<StrategyEngine>> = runner.strategy().clone();

    let feed = Arc::new(MarketDataFeed::new());
    feed.subscribe(Arc::new(runner));

    // Zigzag uptrend starting above the resting ask.
    let mut price = 100.0;
    for step in 0..80 {
        price += if step % 2 == 0 { 1.0 } else { -0.8 };
        feed.publish(MarketUpdate::trade(
            "ACME",
            scale.price_from_f64(price),
            Quantity::from_raw(1),
        ));
        if handle.lock().stats().orders_emitted > 0 {
            break;
        }
    }

    let strategy = handle.lock();
    assert!(strategy.stats().signals_generated >= 1, "no signal fired");
    assert_eq!(strategy.stats().orders_emitted, 1);

    // The buy crossed the resting ask at its price.
    let trades = engine.trade_events();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, ticks(9_900));
    assert_eq!(trades[0].quantity, Quantity::from_raw(10));

    let position = strategy.position("ACME").expect("fill was attributed");
    assert!(position.is_long());
    assert_eq!(position.quantity, 10.0);
    assert!(monitor.event_count() >= 2);
    assert!(metrics.trades_matched() >= 1);
}

#[test]
fn sequence_numbers_cover_every_subscriber() {
    let feed = Arc::new(MarketDataFeed::new());
    let engine = Arc::new(MatchingEngine::new("ACME"));
    let gateway = Arc::new(OrderGateway::new(
        engine.clone(),
        Arc::new(RiskFilter::new()),
        Arc::new(PerformanceMonitor::new()),
        Arc::new(SystemMetrics::new()),
    ));
    let ids = Arc::new(OrderIdAllocator::new());
    feed.subscribe(Arc::new(tickmatch::pipeline::EngineAdapter::new(
        "ACME",
        gateway,
        ids,
    )));

    for i in 0..10u64 {
        let seq = feed.publish(MarketUpdate::quote(
            "ACME",
            Side::Buy,
            ticks(9_000 + i),
            Quantity::from_raw(1),
        ));
        assert_eq!(seq, i + 1);
    }

    assert_eq!(engine.processed_orders(), 10);
    assert_eq!(engine.top_of_book().0, ticks(9_009));
}
