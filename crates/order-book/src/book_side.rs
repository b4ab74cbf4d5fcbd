use crate::price_level::PriceLevel;
use crate::types::{Order, OrderId, Price, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One side of the book: price levels keyed by price, best-first access.
/// Bids take the maximum key as best, asks the minimum. Empty levels are
/// deleted as part of the mutation that empties them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSide {
    levels: BTreeMap<Price, PriceLevel>,
    is_bid: bool,
}

impl BookSide {
    #[inline]
    pub fn new(is_bid: bool) -> Self {
        Self {
            levels: BTreeMap::new(),
            is_bid,
        }
    }

    #[inline]
    pub fn is_bid(&self) -> bool {
        self.is_bid
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[inline]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Rests an order at its limit price, creating the level if absent.
    pub fn insert(&mut self, order: Order) {
        self.levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .push_back(order);
    }

    #[inline]
    fn best_key(&self) -> Option<Price> {
        if self.is_bid {
            self.levels.keys().next_back().copied()
        } else {
            self.levels.keys().next().copied()
        }
    }

    /// Best price of the side, `Price::ZERO` when empty. Callers that need to
    /// distinguish an empty side check `is_empty()`.
    #[inline]
    pub fn best_price(&self) -> Price {
        self.best_key().unwrap_or(Price::ZERO)
    }

    #[inline]
    pub fn best_order(&self) -> Option<&Order> {
        let key = self.best_key()?;
        self.levels.get(&key)?.front()
    }

    #[inline]
    pub fn best_level_mut(&mut self) -> Option<&mut PriceLevel> {
        let key = self.best_key()?;
        self.levels.get_mut(&key)
    }

    /// Pops the front order of the best level, deleting the level if that
    /// empties it.
    pub fn pop_best_order(&mut self) -> Option<Order> {
        let key = self.best_key()?;
        let level = self.levels.get_mut(&key)?;
        let order = level.pop_front();
        if level.is_empty() {
            self.levels.remove(&key);
        }
        order
    }

    /// Deletes the best level if it has gone empty. Used after in-place
    /// mutation through `best_level_mut`.
    pub fn drop_best_if_empty(&mut self) {
        if let Some(key) = self.best_key() {
            if self.levels.get(&key).map_or(false, PriceLevel::is_empty) {
                self.levels.remove(&key);
            }
        }
    }

    /// Removes a resting order by id at a known price. Returns the removed
    /// order, or `None` if no such order rests there.
    pub fn remove(&mut self, order_id: OrderId, price: Price) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let order = level.remove(order_id);
        if order.is_some() && level.is_empty() {
            self.levels.remove(&price);
        }
        order
    }

    /// Quantity resting at `price`, zero when no level exists.
    #[inline]
    pub fn quantity_at(&self, price: Price) -> Quantity {
        self.levels
            .get(&price)
            .map_or(Quantity::ZERO, PriceLevel::total_quantity)
    }

    #[inline]
    pub fn total_quantity(&self) -> Quantity {
        self.levels
            .values()
            .fold(Quantity::ZERO, |acc, level| acc + level.total_quantity())
    }

    /// Best-first (price, aggregate quantity) snapshot of up to `depth` levels.
    pub fn depth(&self, depth: usize) -> Vec<(Price, Quantity)> {
        let take = |level: &PriceLevel| (level.price(), level.total_quantity());
        if self.is_bid {
            self.levels.values().rev().take(depth).map(take).collect()
        } else {
            self.levels.values().take(depth).map(take).collect()
        }
    }
}
