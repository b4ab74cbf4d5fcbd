pub mod filter;

pub use filter::{RiskConfig, RiskFilter, RiskStats};
