use crate::types::MarketUpdate;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// A consumer of market updates. Implementations expose the capabilities they
/// care about; there is no strategy base class. `on_update` runs on the
/// publisher's (or pump's) thread, so implementations use interior mutability
/// and return promptly; the feed makes no progress guarantee past a blocked
/// subscriber.
pub trait MarketSubscriber: Send + Sync {
    fn id(&self) -> Uuid;

    fn name(&self) -> &str;

    fn on_update(&self, update: &MarketUpdate) -> anyhow::Result<()>;
}

/// Fan-out of one feed to its registered subscribers, in registration order.
/// Updates are never dropped: every subscriber sees every published update,
/// stamped with a strictly monotonic sequence number. A failing subscriber is
/// logged and isolated; it cannot affect delivery to the others.
pub struct MarketDataFeed {
    subscribers: RwLock<Vec<Arc<dyn MarketSubscriber>>>,
    sequence: AtomicU64,
    delivered: AtomicU64,
}

impl MarketDataFeed {
    #[inline]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self, subscriber: Arc<dyn MarketSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Stamps the next sequence number and delivers synchronously to every
    /// subscriber. Returns the sequence assigned to this update.
    pub fn publish(&self, mut update: MarketUpdate) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        update.sequence = sequence;

        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            if let Err(e) = subscriber.on_update(&update) {
                error!(
                    subscriber = subscriber.name(),
                    id = %subscriber.id(),
                    sequence,
                    "subscriber failed on update: {e}"
                );
            }
        }
        self.delivered
            .fetch_add(subscribers.len() as u64, Ordering::Relaxed);

        sequence
    }

    /// Highest sequence number published so far.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Total subscriber deliveries attempted (publishes x subscribers).
    #[inline]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

impl Default for MarketDataFeed {
    fn default() -> Self {
        Self::new()
    }
}
