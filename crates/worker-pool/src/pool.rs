use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of OS threads draining a bounded MPMC queue of closures.
/// Enqueue blocks while the queue is full (bounded backpressure); dequeue
/// blocks on an empty queue until shutdown. `shutdown` stops intake, lets the
/// workers drain every queued job, then joins them.
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl WorkerPool {
    /// One worker per available core, queue capacity 1024.
    pub fn new() -> Self {
        Self::with_size(num_cpus::get(), 1024)
    }

    pub fn with_size(threads: usize, queue_capacity: usize) -> Self {
        let threads = threads.max(1);
        let (sender, receiver) = bounded::<Job>(queue_capacity.max(1));

        let workers = (0..threads)
            .map(|worker_id| {
                let receiver = receiver.clone();
                thread::spawn(move || {
                    debug!(worker_id, "worker started");
                    // recv errors only when every sender is dropped and the
                    // queue is empty: drain-then-exit by construction.
                    while let Ok(job) = receiver.recv() {
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            error!(worker_id, "job panicked; worker continuing");
                        }
                    }
                    debug!(worker_id, "worker stopped");
                })
            })
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Runs a closure on some worker. Blocks while the queue is full; returns
    /// `false` once the pool has shut down.
    pub fn execute<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        // Clone out of the lock so a full queue blocks this producer, not
        // everyone else (and not shutdown).
        let sender = self.sender.lock().as_ref().cloned();
        match sender {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Stops intake, drains in-flight work, and joins every worker. Idempotent.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            if handle.join().is_err() {
                error!("worker thread panicked during shutdown");
            }
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn executes_queued_jobs_on_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::with_size(4, 64);

        for _ in 0..100 {
            let counter = counter.clone();
            assert!(pool.execute(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }));
        }

        pool.shutdown();
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn shutdown_drains_before_joining() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::with_size(1, 256);

        for _ in 0..200 {
            let counter = counter.clone();
            pool.execute(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        pool.shutdown();

        assert_eq!(counter.load(Ordering::Relaxed), 200);
        assert!(!pool.execute(|| {}));
    }

    #[test]
    fn panicking_job_does_not_kill_the_worker() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::with_size(1, 16);

        pool.execute(|| panic!("boom"));
        let counter_clone = counter.clone();
        pool.execute(move || {
            counter_clone.fetch_add(1, Ordering::Relaxed);
        });

        pool.shutdown();
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn zero_threads_is_clamped_to_one() {
        let pool = WorkerPool::with_size(0, 1);
        assert_eq!(pool.worker_count(), 1);
    }
}
