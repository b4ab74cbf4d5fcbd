use chrono::{DateTime, Utc};
use order_book::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SignalKind {
    Buy = 0,
    Sell = 1,
    Hold = 2,
    None = 3,
}

impl SignalKind {
    /// Only BUY and SELL translate into orders.
    #[inline]
    pub fn is_actionable(self) -> bool {
        matches!(self, SignalKind::Buy | SignalKind::Sell)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Hold => write!(f, "HOLD"),
            SignalKind::None => write!(f, "NONE"),
        }
    }
}

/// A strategy recommendation. `reason` is diagnostic text capturing the
/// deciding indicator values; it is not machine-parseable and carries no
/// format contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub symbol: String,
    pub price: Price,
    pub quantity: Quantity,
    /// How convinced the rule set is, in [0, 1].
    pub confidence: f64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    #[inline]
    pub fn new(
        kind: SignalKind,
        symbol: impl Into<String>,
        price: Price,
        quantity: Quantity,
        confidence: f64,
        reason: String,
    ) -> Self {
        Self {
            kind,
            symbol: symbol.into(),
            price,
            quantity,
            confidence: confidence.clamp(0.0, 1.0),
            reason,
            timestamp: Utc::now(),
        }
    }

    #[inline]
    pub fn is_actionable(&self) -> bool {
        self.kind.is_actionable()
    }
}
