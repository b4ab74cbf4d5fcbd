//! # tickmatch: single-venue in-memory trading engine
//!
//! A price-time priority limit order book and matching engine with the loop
//! closed around it: market updates fan out to strategies, strategies emit
//! signals, a pre-trade risk filter gates the resulting orders, and trade
//! events feed telemetry and position bookkeeping.

pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod utils;

pub use indicators;
pub use latency_profiler;
pub use market_data;
pub use matching_engine;
pub use order_book;
pub use risk_manager;
pub use strategy_engine;
pub use worker_pool;

pub type Result<T> = anyhow::Result<T>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
