use crate::feed::MarketDataFeed;
use crate::types::MarketUpdate;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

/// Decouples producers from delivery: producers push onto a bounded channel,
/// a dedicated thread drains it into the feed. A single consumer thread keeps
/// per-feed sequence order intact. Shutdown is cooperative: `stop` closes
/// intake, the thread drains whatever is already queued, then joins.
pub struct FeedPump {
    sender: Mutex<Option<Sender<MarketUpdate>>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl FeedPump {
    pub fn start(feed: Arc<MarketDataFeed>, capacity: usize) -> Self {
        let (sender, receiver) = bounded::<MarketUpdate>(capacity);

        let handle = thread::spawn(move || {
            debug!("feed pump started");
            // recv fails only once all senders are gone and the queue is
            // drained, which is exactly the shutdown contract.
            while let Ok(update) = receiver.recv() {
                feed.publish(update);
            }
            debug!("feed pump drained and stopped");
        });

        Self {
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Blocking push; applies backpressure when the queue is full. `false`
    /// once the pump has been stopped.
    pub fn push(&self, update: MarketUpdate) -> bool {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(update).is_ok(),
            None => false,
        }
    }

    /// Non-blocking push for producers that would rather drop on a full queue
    /// than stall.
    pub fn try_push(&self, update: MarketUpdate) -> Result<(), TrySendError<MarketUpdate>> {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.try_send(update),
            None => Err(TrySendError::Disconnected(update)),
        }
    }

    /// Stops intake, drains in-flight updates, and joins the delivery thread.
    /// Idempotent.
    pub fn stop(&self) {
        self.sender.lock().take();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                info!("feed pump thread panicked during shutdown");
            }
        }
    }
}

impl Drop for FeedPump {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MarketSubscriber;
    use order_book::{Price, Quantity};
    use uuid::Uuid;

    struct Collector {
        id: Uuid,
        sequences: Mutex<Vec<u64>>,
    }

    impl MarketSubscriber for Collector {
        fn id(&self) -> Uuid {
            self.id
        }

        fn name(&self) -> &str {
            "collector"
        }

        fn on_update(&self, update: &MarketUpdate) -> anyhow::Result<()> {
            self.sequences.lock().push(update.sequence);
            Ok(())
        }
    }

    #[test]
    fn stop_drains_queued_updates_before_joining() {
        let feed = Arc::new(MarketDataFeed::new());
        let collector = Arc::new(Collector {
            id: Uuid::new_v4(),
            sequences: Mutex::new(Vec::new()),
        });
        feed.subscribe(collector.clone());

        let pump = FeedPump::start(feed.clone(), 64);
        for _ in 0..20 {
            assert!(pump.push(MarketUpdate::trade(
                "ACME",
                Price::from_raw(10_000),
                Quantity::from_raw(1),
            )));
        }
        pump.stop();

        let sequences = collector.sequences.lock();
        assert_eq!(sequences.len(), 20);
        assert!(sequences.windows(2).all(|pair| pair[1] == pair[0] + 1));
        assert!(!pump.push(MarketUpdate::trade(
            "ACME",
            Price::from_raw(10_000),
            Quantity::from_raw(1),
        )));
    }
}
