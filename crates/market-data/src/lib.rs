pub mod feed;
pub mod pump;
pub mod types;

pub use feed::{MarketDataFeed, MarketSubscriber};
pub use pump::FeedPump;
pub use types::{MarketUpdate, UpdateKind};

pub type Result<T> = anyhow::Result<T>;
