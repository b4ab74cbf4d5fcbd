pub mod history;
pub mod studies;

pub use history::{PriceHistory, DEFAULT_CAPACITY};
pub use studies::{macd, momentum_score, percent_change, rsi, sma};
