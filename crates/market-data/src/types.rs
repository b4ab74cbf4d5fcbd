use chrono::{DateTime, Utc};
use order_book::{Price, Quantity, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum UpdateKind {
    Trade = 0,
    Quote = 1,
    BookUpdate = 2,
}

/// One external market event. `sequence` is stamped by the feed at publish
/// time and is strictly monotonic per feed; producers leave it at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketUpdate {
    pub kind: UpdateKind,
    pub symbol: String,
    pub price: Price,
    pub quantity: Quantity,
    pub side: Option<Side>,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
}

impl MarketUpdate {
    #[inline]
    pub fn trade(symbol: impl Into<String>, price: Price, quantity: Quantity) -> Self {
        Self {
            kind: UpdateKind::Trade,
            symbol: symbol.into(),
            price,
            quantity,
            side: None,
            timestamp: Utc::now(),
            sequence: 0,
        }
    }

    #[inline]
    pub fn quote(symbol: impl Into<String>, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            kind: UpdateKind::Quote,
            symbol: symbol.into(),
            price,
            quantity,
            side: Some(side),
            timestamp: Utc::now(),
            sequence: 0,
        }
    }

    #[inline]
    pub fn book_update(
        symbol: impl Into<String>,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            kind: UpdateKind::BookUpdate,
            symbol: symbol.into(),
            side: Some(side),
            price,
            quantity,
            timestamp: Utc::now(),
            sequence: 0,
        }
    }

    /// Whether this update can place quantity on the book (it names a side).
    #[inline]
    pub fn is_book_impacting(&self) -> bool {
        matches!(self.kind, UpdateKind::Quote | UpdateKind::BookUpdate) && self.side.is_some()
    }
}
