pub mod histogram;
pub mod monitor;

pub use histogram::{LatencyHistogram, LatencyPercentiles, LatencySummary};
pub use monitor::PerformanceMonitor;
