use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Price in integer ticks. The tick scale (currency units per tick) is fixed
/// at engine construction; book mutation never touches floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Price(u64);

impl Price {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    #[inline]
    pub fn from_raw(ticks: u64) -> Self {
        Self(ticks)
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Price {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Add for Price {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

/// Unsigned order quantity. A resting order's quantity is its live remaining
/// quantity and only ever decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Quantity(u64);

impl Quantity {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn from_raw(units: u64) -> Self {
        Self(units)
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Quantity {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Add for Quantity {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

/// Conversion between integer ticks and currency units. Floats appear only in
/// indicator and strategy scoring; rounding back to ticks happens exactly once,
/// at the strategy-to-order boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickScale(f64);

impl TickScale {
    /// 1 tick = $0.0001.
    pub const DEFAULT: Self = Self(0.0001);

    #[inline]
    pub fn new(units_per_tick: f64) -> Self {
        Self(units_per_tick)
    }

    #[inline]
    pub fn units_per_tick(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn price_to_f64(self, price: Price) -> f64 {
        price.to_raw() as f64 * self.0
    }

    #[inline]
    pub fn price_from_f64(self, value: f64) -> Price {
        Price::from_raw((value / self.0).round().max(0.0) as u64)
    }
}

impl Default for TickScale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct OrderId(u64);

impl OrderId {
    #[inline]
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic order-id source. Construction-time injected wherever ids are
/// minted, never a process-wide singleton.
#[derive(Debug)]
pub struct OrderIdAllocator {
    next: AtomicU64,
}

impl OrderIdAllocator {
    #[inline]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    #[inline]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    #[inline]
    pub fn next(&self) -> OrderId {
        OrderId(self.next.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

impl Default for OrderIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    #[inline]
    pub fn is_buy(self) -> bool {
        matches!(self, Side::Buy)
    }

    #[inline]
    pub fn is_sell(self) -> bool {
        matches!(self, Side::Sell)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderKind {
    Limit = 0,
    Market = 1,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => write!(f, "LIMIT"),
            OrderKind::Market => write!(f, "MARKET"),
        }
    }
}

/// An order as the engine owns it. `quantity` is the remaining quantity; the
/// identity fields are immutable after creation. Time priority is decided by
/// the engine's serialization order, not by comparing `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub kind: OrderKind,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn new(id: OrderId, side: Side, kind: OrderKind, price: Price, quantity: Quantity) -> Self {
        Self {
            id,
            side,
            kind,
            price,
            quantity,
            timestamp: Utc::now(),
        }
    }

    #[inline]
    pub fn limit(id: OrderId, side: Side, price: Price, quantity: Quantity) -> Self {
        Self::new(id, side, OrderKind::Limit, price, quantity)
    }

    #[inline]
    pub fn market(id: OrderId, side: Side, quantity: Quantity) -> Self {
        Self::new(id, side, OrderKind::Market, Price::ZERO, quantity)
    }

    #[inline]
    pub fn fill(&mut self, quantity: Quantity) {
        self.quantity -= quantity;
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.quantity.is_zero()
    }
}

/// Execution record. Carries identifiers and copies only, never order handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: DateTime<Utc>,
}

impl TradeEvent {
    #[inline]
    pub fn new(buy_order_id: OrderId, sell_order_id: OrderId, price: Price, quantity: Quantity) -> Self {
        Self {
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp: Utc::now(),
        }
    }

    /// Traded notional in raw tick-units, `None` when the product overflows.
    #[inline]
    pub fn notional(&self) -> Option<u64> {
        self.price.to_raw().checked_mul(self.quantity.to_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_scale_round_trips_exact_prices() {
        let scale = TickScale::DEFAULT;
        let price = Price::from_raw(123_400);
        assert_eq!(scale.price_to_f64(price), 12.34);
        assert_eq!(scale.price_from_f64(12.34), price);
    }

    #[test]
    fn tick_scale_rounds_to_nearest_tick() {
        let scale = TickScale::new(0.01);
        assert_eq!(scale.price_from_f64(99.996), Price::from_raw(10_000));
        assert_eq!(scale.price_from_f64(-1.0), Price::ZERO);
    }

    #[test]
    fn order_fill_decrements_remaining() {
        let mut order = Order::limit(
            OrderId::from_raw(1),
            Side::Buy,
            Price::from_raw(10_000),
            Quantity::from_raw(10),
        );
        order.fill(Quantity::from_raw(4));
        assert_eq!(order.quantity, Quantity::from_raw(6));
        assert!(!order.is_filled());
        order.fill(Quantity::from_raw(6));
        assert!(order.is_filled());
    }

    #[test]
    fn trade_notional_checks_for_overflow() {
        let trade = TradeEvent::new(
            OrderId::from_raw(1),
            OrderId::from_raw(2),
            Price::from_raw(10_000),
            Quantity::from_raw(5),
        );
        assert_eq!(trade.notional(), Some(50_000));

        let huge = TradeEvent::new(
            OrderId::from_raw(3),
            OrderId::from_raw(4),
            Price::MAX,
            Quantity::from_raw(2),
        );
        assert_eq!(huge.notional(), None);
    }

    #[test]
    fn allocator_ids_are_monotonic() {
        let ids = OrderIdAllocator::new();
        let a = ids.next();
        let b = ids.next();
        assert!(b.to_raw() > a.to_raw());
    }

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
