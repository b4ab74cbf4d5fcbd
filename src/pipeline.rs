//! Wiring between the fan-out, the strategies, the risk filter, and the
//! engine: updates come in from the feed, candidate orders go through the
//! risk gate, survivors hit the engine, and fills flow back to the strategy
//! that asked for them.

use crate::metrics::SystemMetrics;
use latency_profiler::{LatencyHistogram, LatencyPercentiles, LatencySummary, PerformanceMonitor};
use market_data::{MarketSubscriber, MarketUpdate};
use matching_engine::MatchingEngine;
use order_book::{Order, OrderId, OrderIdAllocator, Side, TradeEvent};
use parking_lot::Mutex;
use risk_manager::RiskFilter;
use std::sync::Arc;
use std::time::Instant;
use strategy_engine::StrategyEngine;
use tracing::warn;
use uuid::Uuid;
use worker_pool::WorkerPool;

/// The single entry point for candidate orders: risk filter, then engine,
/// with per-submit latency captured for the profiler. One gateway per engine,
/// shared by every producer targeting that symbol.
pub struct OrderGateway {
    engine: Arc<MatchingEngine>,
    risk: Arc<RiskFilter>,
    monitor: Arc<PerformanceMonitor>,
    metrics: Arc<SystemMetrics>,
    latency: Mutex<LatencyHistogram>,
}

impl OrderGateway {
    pub fn new(
        engine: Arc<MatchingEngine>,
        risk: Arc<RiskFilter>,
        monitor: Arc<PerformanceMonitor>,
        metrics: Arc<SystemMetrics>,
    ) -> Self {
        Self {
            engine,
            risk,
            monitor,
            metrics,
            latency: Mutex::new(LatencyHistogram::new()),
        }
    }

    /// Filters the batch and submits the survivors, returning every trade the
    /// batch produced. Orders the risk filter drops never reach the engine.
    pub fn submit_batch(&self, orders: Vec<Order>) -> Vec<TradeEvent> {
        let presented = orders.len() as u64;

        // The position-fraction check measures against currently visible
        // liquidity.
        let visible = self.engine.total_quantity(Side::Buy) + self.engine.total_quantity(Side::Sell);
        self.risk.set_reference_liquidity(visible);

        let accepted = self.risk.filter(orders);
        let dropped = presented - accepted.len() as u64;
        if dropped > 0 {
            self.metrics.record_orders_rejected(dropped);
        }

        let mut trades = Vec::new();
        for order in accepted {
            let order_id = order.id;
            let started = Instant::now();
            match self.engine.submit(order) {
                Ok(outcome) => {
                    self.latency.lock().record(started.elapsed());

                    self.monitor.record_event();
                    self.metrics.record_orders_submitted(1);
                    let batch_trades = outcome.trades();
                    if let Some(last) = batch_trades.last() {
                        let notional = batch_trades
                            .iter()
                            .filter_map(TradeEvent::notional)
                            .fold(0u64, u64::saturating_add);
                        self.metrics.record_trades_matched(
                            batch_trades.len() as u64,
                            self.engine.tick_scale().price_to_f64(last.price),
                            notional,
                        );
                    }
                    trades.extend_from_slice(batch_trades);
                }
                Err(e) => {
                    warn!(order_id = %order_id, "engine rejected order: {e}");
                }
            }
        }
        trades
    }

    #[inline]
    pub fn engine(&self) -> &Arc<MatchingEngine> {
        &self.engine
    }

    #[inline]
    pub fn risk(&self) -> &Arc<RiskFilter> {
        &self.risk
    }

    #[inline]
    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    pub fn latency_percentiles(&self) -> LatencyPercentiles {
        self.latency.lock().percentiles()
    }

    pub fn latency_summary(&self) -> LatencySummary {
        self.latency.lock().summary()
    }
}

/// Feed subscriber that applies book-impacting updates to the engine: quotes
/// and book updates carrying a side become LIMIT orders through the gateway.
/// Trades are strategy fodder and never touch the book from here.
pub struct EngineAdapter {
    id: Uuid,
    name: String,
    symbol: String,
    gateway: Arc<OrderGateway>,
    ids: Arc<OrderIdAllocator>,
}

impl EngineAdapter {
    pub fn new(symbol: impl Into<String>, gateway: Arc<OrderGateway>, ids: Arc<OrderIdAllocator>) -> Self {
        let symbol = symbol.into();
        Self {
            id: Uuid::new_v4(),
            name: format!("engine-adapter:{symbol}"),
            symbol,
            gateway,
            ids,
        }
    }
}

impl MarketSubscriber for EngineAdapter {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_update(&self, update: &MarketUpdate) -> anyhow::Result<()> {
        if update.symbol != self.symbol
            || !update.is_book_impacting()
            || update.price.is_zero()
            || update.quantity.is_zero()
        {
            return Ok(());
        }
        let Some(side) = update.side else {
            return Ok(());
        };

        let order = Order::limit(self.ids.next(), side, update.price, update.quantity);
        self.gateway.submit_batch(vec![order]);
        Ok(())
    }
}

/// Feed subscriber that drives one strategy instance for one symbol. Signal
/// evaluation runs on the delivery thread; order submission and fill
/// attribution run on the worker pool when one is attached, inline otherwise.
pub struct StrategyRunner {
    id: Uuid,
    name: String,
    symbol: String,
    strategy: Arc<Mutex<StrategyEngine>>,
    gateway: Arc<OrderGateway>,
    ids: Arc<OrderIdAllocator>,
    pool: Option<Arc<WorkerPool>>,
}

impl StrategyRunner {
    pub fn new(
        symbol: impl Into<String>,
        strategy: StrategyEngine,
        gateway: Arc<OrderGateway>,
        ids: Arc<OrderIdAllocator>,
    ) -> Self {
        let symbol = symbol.into();
        let name = format!("{}:{symbol}", strategy.name());
        Self {
            id: Uuid::new_v4(),
            name,
            symbol,
            strategy: Arc::new(Mutex::new(strategy)),
            gateway,
            ids,
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    #[inline]
    pub fn strategy(&self) -> &Arc<Mutex<StrategyEngine>> {
        &self.strategy
    }

    fn dispatch(&self, order: Order) {
        let strategy = Arc::clone(&self.strategy);
        let gateway = Arc::clone(&self.gateway);
        let symbol = self.symbol.clone();
        let work = move || {
            let order_id = order.id;
            let trades = gateway.submit_batch(vec![order]);
            attribute_fills(&strategy, &symbol, order_id, &trades);
        };

        match &self.pool {
            Some(pool) => {
                if !pool.execute(work) {
                    warn!(runner = %self.name, "worker pool is shut down; order dropped");
                }
            }
            None => work(),
        }
    }
}

impl MarketSubscriber for StrategyRunner {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn on_update(&self, update: &MarketUpdate) -> anyhow::Result<()> {
        if update.symbol != self.symbol {
            return Ok(());
        }

        let order = {
            let mut strategy = self.strategy.lock();
            match strategy.on_update(update) {
                Some(signal) if signal.is_actionable() => {
                    let id = self.ids.next();
                    strategy.signal_to_order(&signal, id)
                }
                _ => None,
            }
        };

        if let Some(order) = order {
            self.dispatch(order);
        }
        Ok(())
    }
}

/// Books trades against the strategy that owns `order_id`.
fn attribute_fills(
    strategy: &Mutex<StrategyEngine>,
    symbol: &str,
    order_id: OrderId,
    trades: &[TradeEvent],
) {
    let mut strategy = strategy.lock();
    for trade in trades {
        if trade.buy_order_id == order_id {
            strategy.on_fill(symbol, Side::Buy, trade.price, trade.quantity);
        } else if trade.sell_order_id == order_id {
            strategy.on_fill(symbol, Side::Sell, trade.price, trade.quantity);
        }
    }
}
