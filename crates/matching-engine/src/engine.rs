use crate::audit::{AuditKind, AuditRecord, AuditSink};
use order_book::{
    BookSide, Order, OrderId, OrderKind, Price, Quantity, Side, TickScale, TradeEvent,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("order {order_id} rejected: quantity must be positive")]
    ZeroQuantity { order_id: OrderId },
    #[error("order {order_id} rejected: limit price must be positive")]
    ZeroLimitPrice { order_id: OrderId },
}

/// Result of one submit. All trades listed here were produced atomically with
/// any remainder insertion; readers never observe a half-applied submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Nothing crossed. A LIMIT order now rests; a MARKET order was discarded.
    NoMatch,
    /// Some quantity crossed, some remained. A LIMIT remainder rests; a
    /// MARKET remainder was discarded for want of liquidity.
    Partial {
        trades: Vec<TradeEvent>,
        remaining: Quantity,
    },
    /// The incoming order was fully filled.
    Full { trades: Vec<TradeEvent> },
}

impl MatchOutcome {
    #[inline]
    pub fn trades(&self) -> &[TradeEvent] {
        match self {
            MatchOutcome::NoMatch => &[],
            MatchOutcome::Partial { trades, .. } => trades,
            MatchOutcome::Full { trades } => trades,
        }
    }

    #[inline]
    pub fn filled_quantity(&self) -> Quantity {
        self.trades()
            .iter()
            .fold(Quantity::ZERO, |acc, trade| acc + trade.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub tick_scale: TickScale,
    /// Most recent trade events retained for `trade_events()` snapshots.
    pub trade_retention: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_scale: TickScale::DEFAULT,
            trade_retention: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub symbol: String,
    pub processed_orders: u64,
    pub matched_trades: u64,
    pub average_latency_ns: f64,
}

/// Everything the engine's lock guards: both sides, the id index, and the
/// bounded trade log. The index holds an entry iff an order with that id is
/// resting at the recorded (price, side).
#[derive(Debug)]
struct Book {
    bids: BookSide,
    asks: BookSide,
    index: HashMap<OrderId, (Price, Side)>,
    trades: VecDeque<TradeEvent>,
}

/// Price-time priority matching engine for a single symbol. All mutation is
/// serialized on the write lock; snapshots take the read lock plus atomics.
pub struct MatchingEngine {
    symbol: String,
    config: EngineConfig,
    book: RwLock<Book>,
    processed_orders: AtomicU64,
    matched_trades: AtomicU64,
    total_latency_ns: AtomicU64,
    audit: Option<Arc<dyn AuditSink>>,
}

impl MatchingEngine {
    #[inline]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_config(symbol, EngineConfig::default())
    }

    pub fn with_config(symbol: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            symbol: symbol.into(),
            config,
            book: RwLock::new(Book {
                bids: BookSide::new(true),
                asks: BookSide::new(false),
                index: HashMap::new(),
                trades: VecDeque::with_capacity(1024),
            }),
            processed_orders: AtomicU64::new(0),
            matched_trades: AtomicU64::new(0),
            total_latency_ns: AtomicU64::new(0),
            audit: None,
        }
    }

    /// Attaches a consistency-audit sink. Construction-time only; there is no
    /// global auditor.
    pub fn audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[inline]
    pub fn tick_scale(&self) -> TickScale {
        self.config.tick_scale
    }

    /// Matches the order against the opposite side and rests any LIMIT
    /// remainder. Rejects invalid orders without touching the book.
    pub fn submit(&self, mut order: Order) -> Result<MatchOutcome, EngineError> {
        if order.quantity.is_zero() {
            return Err(EngineError::ZeroQuantity { order_id: order.id });
        }
        if order.kind == OrderKind::Limit && order.price.is_zero() {
            return Err(EngineError::ZeroLimitPrice { order_id: order.id });
        }

        let started = Instant::now();
        let mut book = self.book.write();
        let Book {
            bids,
            asks,
            index,
            trades: trade_log,
        } = &mut *book;

        let trades = match order.side {
            Side::Buy => Self::match_against(&mut order, asks, index),
            Side::Sell => Self::match_against(&mut order, bids, index),
        };

        let remaining = order.quantity;
        if !remaining.is_zero() {
            match order.kind {
                OrderKind::Limit => {
                    index.insert(order.id, (order.price, order.side));
                    match order.side {
                        Side::Buy => bids.insert(order),
                        Side::Sell => asks.insert(order),
                    }
                }
                OrderKind::Market => {
                    debug!(
                        symbol = %self.symbol,
                        order_id = %order.id,
                        remaining = %remaining,
                        "market order remainder discarded, no liquidity"
                    );
                }
            }
        }

        for trade in &trades {
            while trade_log.len() >= self.config.trade_retention.max(1) {
                trade_log.pop_front();
            }
            trade_log.push_back(trade.clone());
        }
        drop(book);

        let elapsed = started.elapsed().as_nanos() as u64;
        self.total_latency_ns.fetch_add(elapsed, Ordering::Relaxed);
        self.matched_trades
            .fetch_add(trades.len() as u64, Ordering::Relaxed);
        self.processed_orders.fetch_add(1, Ordering::Relaxed);

        Ok(Self::outcome(trades, remaining))
    }

    /// Removes a resting order by id. `false` for unknown or already retired
    /// ids; a successful cancel makes every later call return `false`.
    pub fn cancel(&self, order_id: OrderId) -> bool {
        let mut book = self.book.write();
        let Book {
            bids, asks, index, ..
        } = &mut *book;

        let Some(&(price, side)) = index.get(&order_id) else {
            self.audit(AuditKind::CancelUnknown, format!("cancel {order_id}: no index entry"));
            return false;
        };

        let removed = match side {
            Side::Buy => bids.remove(order_id, price),
            Side::Sell => asks.remove(order_id, price),
        };

        match removed {
            Some(_) => {
                index.remove(&order_id);
                true
            }
            None => {
                // Index said the order rests but the level disagrees. Clean up
                // the entry and report cancel-not-found.
                debug_assert!(
                    false,
                    "order index desync: {order_id} indexed at {price} {side} but not resting"
                );
                warn!(
                    symbol = %self.symbol,
                    order_id = %order_id,
                    price = %price,
                    "order index desync, dropping stale entry"
                );
                index.remove(&order_id);
                self.audit(
                    AuditKind::IndexDesync,
                    format!("{order_id} indexed at {price} {side} but not resting"),
                );
                false
            }
        }
    }

    /// (best bid, best ask) in ticks; `Price::ZERO` marks an empty side.
    #[inline]
    pub fn top_of_book(&self) -> (Price, Price) {
        let book = self.book.read();
        (book.bids.best_price(), book.asks.best_price())
    }

    /// Best-first (price, aggregate quantity) levels for one side.
    pub fn depth(&self, side: Side, levels: usize) -> Vec<(Price, Quantity)> {
        let book = self.book.read();
        match side {
            Side::Buy => book.bids.depth(levels),
            Side::Sell => book.asks.depth(levels),
        }
    }

    /// Snapshot of the most recent trades, oldest first.
    pub fn trade_events(&self) -> Vec<TradeEvent> {
        self.book.read().trades.iter().cloned().collect()
    }

    /// Where the id currently rests, if anywhere.
    #[inline]
    pub fn locate(&self, order_id: OrderId) -> Option<(Price, Side)> {
        self.book.read().index.get(&order_id).copied()
    }

    #[inline]
    pub fn resting_order_count(&self) -> usize {
        self.book.read().index.len()
    }

    #[inline]
    pub fn total_quantity(&self, side: Side) -> Quantity {
        let book = self.book.read();
        match side {
            Side::Buy => book.bids.total_quantity(),
            Side::Sell => book.asks.total_quantity(),
        }
    }

    pub fn stats(&self) -> EngineStats {
        let processed = self.processed_orders.load(Ordering::Relaxed);
        let total_ns = self.total_latency_ns.load(Ordering::Relaxed);
        EngineStats {
            symbol: self.symbol.clone(),
            processed_orders: processed,
            matched_trades: self.matched_trades.load(Ordering::Relaxed),
            average_latency_ns: if processed > 0 {
                total_ns as f64 / processed as f64
            } else {
                0.0
            },
        }
    }

    #[inline]
    pub fn processed_orders(&self) -> u64 {
        self.processed_orders.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn matched_trades(&self) -> u64 {
        self.matched_trades.load(Ordering::Relaxed)
    }

    fn match_against(
        incoming: &mut Order,
        opposite: &mut BookSide,
        index: &mut HashMap<OrderId, (Price, Side)>,
    ) -> Vec<TradeEvent> {
        let mut trades = Vec::new();

        while !incoming.quantity.is_zero() && !opposite.is_empty() {
            let resting_price = opposite.best_price();
            let crosses = match incoming.kind {
                OrderKind::Market => true,
                OrderKind::Limit => match incoming.side {
                    Side::Buy => incoming.price >= resting_price,
                    Side::Sell => incoming.price <= resting_price,
                },
            };
            if !crosses {
                break;
            }

            let retired = {
                let Some(level) = opposite.best_level_mut() else {
                    break;
                };
                let Some(resting) = level.front_mut() else {
                    break;
                };

                // Executes at the resting order's price.
                let quantity = incoming.quantity.min(resting.quantity);
                let (buy_id, sell_id) = match incoming.side {
                    Side::Buy => (incoming.id, resting.id),
                    Side::Sell => (resting.id, incoming.id),
                };
                trades.push(TradeEvent::new(buy_id, sell_id, resting.price, quantity));

                incoming.fill(quantity);
                resting.fill(quantity);
                let resting_filled = resting.is_filled();
                let resting_id = resting.id;
                level.reduce(quantity);

                if resting_filled {
                    level.pop_front();
                    Some(resting_id)
                } else {
                    None
                }
            };

            if let Some(retired_id) = retired {
                index.remove(&retired_id);
                opposite.drop_best_if_empty();
            }
        }

        trades
    }

    fn outcome(trades: Vec<TradeEvent>, remaining: Quantity) -> MatchOutcome {
        if trades.is_empty() {
            MatchOutcome::NoMatch
        } else if remaining.is_zero() {
            MatchOutcome::Full { trades }
        } else {
            MatchOutcome::Partial { trades, remaining }
        }
    }

    #[inline]
    fn audit(&self, kind: AuditKind, detail: String) {
        if let Some(sink) = &self.audit {
            sink.record(AuditRecord::new(kind, detail));
        }
    }
}
