use order_book::{Order, Quantity};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Pre-trade limits. A value of 0 disables the respective check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Largest single-order quantity.
    pub max_order_quantity: u64,
    /// Largest single-order notional (price ticks x quantity).
    pub max_notional_per_order: u64,
    /// Orders accepted out of one presented batch.
    pub max_orders_per_batch: u32,
    /// Cumulative accepted quantity per session.
    pub max_daily_volume: u64,
    /// Largest single-order quantity as a fraction of the reference
    /// liquidity pushed via `set_reference_liquidity` (e.g. 0.01 = 1% of the
    /// visible book). Disabled while either value is 0.
    pub max_position_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_order_quantity: 0,
            max_notional_per_order: 0,
            max_orders_per_batch: 0,
            max_daily_volume: 0,
            max_position_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskStats {
    pub orders_rejected: u64,
    pub daily_volume: u64,
}

/// Stateful pre-trade gate. The config is an immutable snapshot taken at
/// construction; the mutable state (cumulative volume, rejection counter)
/// lives in atomics so the filter can sit behind an `Arc` shared by several
/// producers. Callers must not re-present accepted orders; each presented
/// order is charged against the daily volume exactly once.
#[derive(Debug)]
pub struct RiskFilter {
    config: RiskConfig,
    daily_volume: AtomicU64,
    orders_rejected: AtomicU64,
    reference_liquidity: AtomicU64,
}

impl RiskFilter {
    #[inline]
    pub fn new() -> Self {
        Self::with_config(RiskConfig::default())
    }

    #[inline]
    pub fn with_config(config: RiskConfig) -> Self {
        Self {
            config,
            daily_volume: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            reference_liquidity: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Updates the liquidity base for the position-percentage check, e.g.
    /// the visible resting quantity on the relevant side of the book.
    #[inline]
    pub fn set_reference_liquidity(&self, quantity: Quantity) {
        self.reference_liquidity
            .store(quantity.to_raw(), Ordering::Relaxed);
    }

    /// Drops every order that fails a check and passes the rest through in
    /// order. Rejections bump a counter; the caller is not told which rule
    /// fired (the debug log carries that detail).
    pub fn filter(&self, orders: Vec<Order>) -> Vec<Order> {
        let mut accepted = Vec::with_capacity(orders.len());

        for order in orders {
            if !self.admit(&order, accepted.len()) {
                self.orders_rejected.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            accepted.push(order);
        }

        accepted
    }

    #[inline]
    pub fn orders_rejected(&self) -> u64 {
        self.orders_rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn daily_volume(&self) -> u64 {
        self.daily_volume.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> RiskStats {
        RiskStats {
            orders_rejected: self.orders_rejected(),
            daily_volume: self.daily_volume(),
        }
    }

    /// Session boundary: clears both the rejection counter and the volume.
    pub fn reset_counters(&self) {
        self.orders_rejected.store(0, Ordering::Relaxed);
        self.daily_volume.store(0, Ordering::Relaxed);
    }

    pub fn reset_daily_volume(&self) {
        self.daily_volume.store(0, Ordering::Relaxed);
    }

    fn admit(&self, order: &Order, accepted_in_batch: usize) -> bool {
        let quantity = order.quantity.to_raw();

        if self.config.max_order_quantity != 0 && quantity > self.config.max_order_quantity {
            debug!(order_id = %order.id, quantity, "risk: order quantity over cap");
            return false;
        }

        if self.config.max_notional_per_order != 0 {
            // Overflowing notional is by definition over any configured cap.
            let over = order
                .price
                .to_raw()
                .checked_mul(quantity)
                .map_or(true, |notional| notional > self.config.max_notional_per_order);
            if over {
                debug!(order_id = %order.id, "risk: order notional over cap");
                return false;
            }
        }

        if self.config.max_orders_per_batch != 0
            && accepted_in_batch >= self.config.max_orders_per_batch as usize
        {
            debug!(order_id = %order.id, "risk: batch already full");
            return false;
        }

        if self.config.max_position_pct > 0.0 {
            let reference = self.reference_liquidity.load(Ordering::Relaxed);
            if reference > 0 {
                let cap = self.config.max_position_pct * reference as f64;
                if quantity as f64 > cap {
                    debug!(order_id = %order.id, quantity, cap, "risk: over position fraction");
                    return false;
                }
            }
        }

        if self.config.max_daily_volume != 0 {
            let cap = self.config.max_daily_volume;
            let admitted = self
                .daily_volume
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |volume| {
                    volume.checked_add(quantity).filter(|&total| total <= cap)
                })
                .is_ok();
            if !admitted {
                debug!(order_id = %order.id, quantity, "risk: daily volume exhausted");
                return false;
            }
        }

        true
    }
}

impl Default for RiskFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_book::{OrderId, Price, Side};

    fn order(id: u64, price: u64, qty: u64) -> Order {
        Order::limit(
            OrderId::from_raw(id),
            Side::Buy,
            Price::from_raw(price),
            Quantity::from_raw(qty),
        )
    }

    #[test]
    fn disabled_filter_passes_everything() {
        let filter = RiskFilter::new();
        let orders = vec![order(1, 10_000, 1_000_000), order(2, 1, 1)];
        let accepted = filter.filter(orders.clone());
        assert_eq!(accepted, orders);
        assert_eq!(filter.orders_rejected(), 0);
    }

    #[test]
    fn quantity_cap_drops_oversized_orders() {
        let filter = RiskFilter::with_config(RiskConfig {
            max_order_quantity: 100,
            ..RiskConfig::default()
        });
        let accepted = filter.filter(vec![order(1, 10_000, 200), order(2, 10_000, 100)]);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, OrderId::from_raw(2));
        assert_eq!(filter.orders_rejected(), 1);
    }

    #[test]
    fn notional_cap_uses_price_times_quantity() {
        let filter = RiskFilter::with_config(RiskConfig {
            max_notional_per_order: 1_000_000,
            ..RiskConfig::default()
        });
        // 10_000 * 101 > 1_000_000 but 10_000 * 100 passes.
        let accepted = filter.filter(vec![order(1, 10_000, 101), order(2, 10_000, 100)]);
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, OrderId::from_raw(2));
    }

    #[test]
    fn batch_cap_counts_accepted_not_presented() {
        let filter = RiskFilter::with_config(RiskConfig {
            max_order_quantity: 10,
            max_orders_per_batch: 2,
            ..RiskConfig::default()
        });
        // First order is rejected on quantity, so two more still fit.
        let accepted = filter.filter(vec![
            order(1, 10_000, 50),
            order(2, 10_000, 5),
            order(3, 10_000, 5),
            order(4, 10_000, 5),
        ]);
        assert_eq!(accepted.len(), 2);
        assert_eq!(filter.orders_rejected(), 2);
    }

    #[test]
    fn daily_volume_accumulates_across_batches() {
        let filter = RiskFilter::with_config(RiskConfig {
            max_daily_volume: 100,
            ..RiskConfig::default()
        });
        assert_eq!(filter.filter(vec![order(1, 10_000, 60)]).len(), 1);
        assert_eq!(filter.filter(vec![order(2, 10_000, 60)]).len(), 0);
        assert_eq!(filter.filter(vec![order(3, 10_000, 40)]).len(), 1);
        assert_eq!(filter.daily_volume(), 100);

        filter.reset_daily_volume();
        assert_eq!(filter.filter(vec![order(4, 10_000, 60)]).len(), 1);
    }

    #[test]
    fn position_pct_needs_a_reference() {
        let filter = RiskFilter::with_config(RiskConfig {
            max_position_pct: 0.1,
            ..RiskConfig::default()
        });
        // No reference yet: the check is disabled.
        assert_eq!(filter.filter(vec![order(1, 10_000, 1_000)]).len(), 1);

        filter.set_reference_liquidity(Quantity::from_raw(1_000));
        assert_eq!(filter.filter(vec![order(2, 10_000, 200)]).len(), 0);
        assert_eq!(filter.filter(vec![order(3, 10_000, 100)]).len(), 1);
    }

    #[test]
    fn refiltering_accepted_orders_changes_nothing() {
        let filter = RiskFilter::with_config(RiskConfig {
            max_order_quantity: 100,
            max_notional_per_order: 10_000_000,
            ..RiskConfig::default()
        });
        let accepted = filter.filter(vec![order(1, 10_000, 50), order(2, 10_000, 500)]);
        let refiltered = filter.filter(accepted.clone());
        assert_eq!(refiltered, accepted);
    }

    #[test]
    fn reset_counters_clears_both() {
        let filter = RiskFilter::with_config(RiskConfig {
            max_order_quantity: 1,
            max_daily_volume: 10,
            ..RiskConfig::default()
        });
        filter.filter(vec![order(1, 10_000, 5), order(2, 10_000, 1)]);
        assert_eq!(filter.orders_rejected(), 1);
        assert_eq!(filter.daily_volume(), 1);

        filter.reset_counters();
        assert_eq!(filter.stats(), RiskStats { orders_rejected: 0, daily_volume: 0 });
    }
}
