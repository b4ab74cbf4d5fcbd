use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// Start/stop throughput bracket. `record_event` is an atomic increment and
/// safe from any thread; `events_per_second` measures against the current
/// time while running and against the stop time afterwards, returning 0 when
/// no time has elapsed.
#[derive(Debug)]
pub struct PerformanceMonitor {
    started_at: Mutex<Option<Instant>>,
    stopped_at: Mutex<Option<Instant>>,
    event_count: AtomicU64,
    running: AtomicBool,
}

impl PerformanceMonitor {
    #[inline]
    pub fn new() -> Self {
        Self {
            started_at: Mutex::new(None),
            stopped_at: Mutex::new(None),
            event_count: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    /// Starts (or restarts) the bracket and clears the counter.
    pub fn start(&self) {
        self.event_count.store(0, Ordering::Relaxed);
        *self.started_at.lock() = Some(Instant::now());
        *self.stopped_at.lock() = None;
        self.running.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            *self.stopped_at.lock() = Some(Instant::now());
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    pub fn record_event(&self) {
        if self.is_running() {
            self.event_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    pub fn events_per_second(&self) -> f64 {
        let Some(started) = *self.started_at.lock() else {
            return 0.0;
        };
        let elapsed = match *self.stopped_at.lock() {
            Some(stopped) => stopped.duration_since(started),
            None => started.elapsed(),
        };
        let seconds = elapsed.as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.event_count.load(Ordering::Relaxed) as f64 / seconds
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn events_are_ignored_before_start() {
        let monitor = PerformanceMonitor::new();
        monitor.record_event();
        assert_eq!(monitor.event_count(), 0);
        assert_eq!(monitor.events_per_second(), 0.0);
    }

    #[test]
    fn rate_uses_stop_time_once_stopped() {
        let monitor = PerformanceMonitor::new();
        monitor.start();
        for _ in 0..100 {
            monitor.record_event();
        }
        std::thread::sleep(Duration::from_millis(20));
        monitor.stop();

        let rate = monitor.events_per_second();
        assert!(rate > 0.0);

        // Frozen after stop: a later reading matches.
        std::thread::sleep(Duration::from_millis(20));
        let later = monitor.events_per_second();
        assert_eq!(rate, later);
    }

    #[test]
    fn restart_clears_the_counter() {
        let monitor = PerformanceMonitor::new();
        monitor.start();
        monitor.record_event();
        monitor.stop();
        monitor.start();
        assert_eq!(monitor.event_count(), 0);
        assert!(monitor.is_running());
    }

    #[test]
    fn events_after_stop_are_not_counted() {
        let monitor = PerformanceMonitor::new();
        monitor.start();
        monitor.record_event();
        monitor.stop();
        monitor.record_event();
        assert_eq!(monitor.event_count(), 1);
    }
}
