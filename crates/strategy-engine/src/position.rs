use chrono::{DateTime, Utc};
use order_book::Side;
use serde::{Deserialize, Serialize};

/// Session P&L ledger for one symbol, fed by the strategy's own fills.
/// Quantity is signed (long > 0, short < 0); the volume-weighted average
/// price moves only when the position quantity changes. This bookkeeping is
/// advisory: it reflects fills attributed to this strategy, not venue truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub average_price: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub mark_price: Option<f64>,
    pub last_update: DateTime<Utc>,
}

impl Position {
    #[inline]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0.0,
            average_price: 0.0,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            mark_price: None,
            last_update: Utc::now(),
        }
    }

    #[inline]
    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    #[inline]
    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    #[inline]
    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }

    /// Applies a fill. Same-direction fills re-weight the average price;
    /// opposite-direction fills realize P&L against it, flipping the
    /// position if the fill is larger than what it closes.
    pub fn apply_fill(&mut self, side: Side, price: f64, quantity: f64) {
        let signed = match side {
            Side::Buy => quantity,
            Side::Sell => -quantity,
        };

        if self.is_flat() {
            self.quantity = signed;
            self.average_price = price;
        } else if self.quantity.signum() == signed.signum() {
            let cost = self.average_price * self.quantity.abs() + price * quantity;
            self.quantity += signed;
            self.average_price = cost / self.quantity.abs();
        } else {
            let closing = quantity.min(self.quantity.abs());
            let pnl_per_unit = if self.is_long() {
                price - self.average_price
            } else {
                self.average_price - price
            };
            self.realized_pnl += pnl_per_unit * closing;

            self.quantity += signed;
            if self.is_flat() {
                self.average_price = 0.0;
            } else if self.quantity.signum() == signed.signum() {
                // Flipped through flat; the remainder opened at the fill price.
                self.average_price = price;
            }
        }

        self.refresh_unrealized();
        self.last_update = Utc::now();
    }

    /// Marks the open quantity against a reference price.
    pub fn mark_to(&mut self, price: f64) {
        self.mark_price = Some(price);
        self.refresh_unrealized();
        self.last_update = Utc::now();
    }

    fn refresh_unrealized(&mut self) {
        self.unrealized_pnl = match self.mark_price {
            Some(mark) if !self.is_flat() => {
                let per_unit = if self.is_long() {
                    mark - self.average_price
                } else {
                    self.average_price - mark
                };
                per_unit * self.quantity.abs()
            }
            _ => 0.0,
        };
    }
}
