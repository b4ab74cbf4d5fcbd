//! Process-wide counters, mirrored onto the `metrics` facade so any installed
//! recorder (exporter, test harness) sees them too.

use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct SystemMetrics {
    updates_published: AtomicU64,
    orders_submitted: AtomicU64,
    trades_matched: AtomicU64,
    notional_traded: AtomicU64,
    orders_rejected: AtomicU64,
}

impl SystemMetrics {
    pub fn new() -> Self {
        Self {
            updates_published: AtomicU64::new(0),
            orders_submitted: AtomicU64::new(0),
            trades_matched: AtomicU64::new(0),
            notional_traded: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
        }
    }

    pub fn record_update_published(&self) {
        self.updates_published.fetch_add(1, Ordering::Relaxed);
        counter!("market_updates_published_total").increment(1);
    }

    pub fn record_orders_submitted(&self, count: u64) {
        self.orders_submitted.fetch_add(count, Ordering::Relaxed);
        counter!("orders_submitted_total").increment(count);
    }

    pub fn record_trades_matched(&self, count: u64, last_price: f64, notional: u64) {
        self.trades_matched.fetch_add(count, Ordering::Relaxed);
        self.notional_traded.fetch_add(notional, Ordering::Relaxed);
        counter!("trades_matched_total").increment(count);
        counter!("notional_traded_total").increment(notional);
        gauge!("last_trade_price").set(last_price);
    }

    pub fn record_orders_rejected(&self, count: u64) {
        self.orders_rejected.fetch_add(count, Ordering::Relaxed);
        counter!("orders_rejected_total").increment(count);
    }

    pub fn updates_published(&self) -> u64 {
        self.updates_published.load(Ordering::Relaxed)
    }

    pub fn orders_submitted(&self) -> u64 {
        self.orders_submitted.load(Ordering::Relaxed)
    }

    pub fn trades_matched(&self) -> u64 {
        self.trades_matched.load(Ordering::Relaxed)
    }

    pub fn notional_traded(&self) -> u64 {
        self.notional_traded.load(Ordering::Relaxed)
    }

    pub fn orders_rejected(&self) -> u64 {
        self.orders_rejected.load(Ordering::Relaxed)
    }
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = SystemMetrics::new();
        metrics.record_update_published();
        metrics.record_update_published();
        metrics.record_orders_submitted(3);
        metrics.record_trades_matched(2, 12.34, 100_000);
        metrics.record_orders_rejected(1);

        assert_eq!(metrics.updates_published(), 2);
        assert_eq!(metrics.orders_submitted(), 3);
        assert_eq!(metrics.trades_matched(), 2);
        assert_eq!(metrics.notional_traded(), 100_000);
        assert_eq!(metrics.orders_rejected(), 1);
    }
}
